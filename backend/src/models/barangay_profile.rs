use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppResult;
use crate::validation::{clean, max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BarangayProfile {
    pub id: i64,
    pub barangay_name: String,
    pub municipality: String,
    pub province: String,
    pub place_issued: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BarangayProfileRequest {
    pub barangay_name: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub place_issued: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarangayProfileInput {
    pub barangay_name: String,
    pub municipality: String,
    pub province: String,
    pub place_issued: Option<String>,
}

impl BarangayProfileRequest {
    pub fn validate(self) -> AppResult<BarangayProfileInput> {
        let [barangay_name, municipality, province] = required(
            [self.barangay_name, self.municipality, self.province],
            "barangay_name, municipality, and province are required.",
        )?;
        let place_issued = clean(self.place_issued);
        max_len(Some(&barangay_name), 100, "Barangay name")?;
        max_len(Some(&municipality), 100, "Municipality")?;
        max_len(Some(&province), 100, "Province")?;
        max_len(place_issued.as_deref(), 255, "Place issued")?;
        Ok(BarangayProfileInput {
            barangay_name,
            municipality,
            province,
            place_issued,
        })
    }
}
