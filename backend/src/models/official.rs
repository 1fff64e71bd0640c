use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::upload::UploadedFile;
use crate::error::AppResult;
use crate::validation::{max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Official {
    pub id: i64,
    pub full_name: String,
    pub position: String,
    pub order_no: i32,
    pub is_captain: bool,
    pub is_secretary: bool,
    pub signature_path: Option<String>,
    pub picture_path: Option<String>,
}

/// Multipart body of `POST /officials` and `PUT /officials/{id}`.
#[derive(Debug, Default)]
pub struct OfficialForm {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub order_no: Option<i32>,
    pub is_captain: bool,
    pub is_secretary: bool,
    pub signature: Option<UploadedFile>,
    pub picture: Option<UploadedFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfficialInput {
    pub full_name: String,
    pub position: String,
    pub order_no: i32,
    pub is_captain: bool,
    pub is_secretary: bool,
}

impl OfficialForm {
    /// Splits the form into validated fields and the (optional) uploads.
    pub fn validate(
        self,
    ) -> AppResult<(OfficialInput, Option<UploadedFile>, Option<UploadedFile>)> {
        let [full_name, position] =
            required([self.full_name, self.position], "full_name and position are required.")?;
        max_len(Some(&full_name), 100, "Full name")?;
        max_len(Some(&position), 100, "Position")?;
        let input = OfficialInput {
            full_name,
            position,
            order_no: self.order_no.unwrap_or(0),
            is_captain: self.is_captain,
            is_secretary: self.is_secretary,
        };
        Ok((input, self.signature, self.picture))
    }
}
