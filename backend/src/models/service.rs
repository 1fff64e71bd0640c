use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, required};

/// A social service or program delivered to residents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub service_name: String,
    pub description: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub beneficiary_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceRequest {
    pub service_name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub service_date: Option<NaiveDate>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInput {
    pub service_name: String,
    pub description: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub location: Option<String>,
}

impl ServiceRequest {
    pub fn validate(self) -> AppResult<ServiceInput> {
        let [service_name] = required([self.service_name], "service_name is required.")?;
        let input = ServiceInput {
            service_name,
            description: clean(self.description),
            service_date: self.service_date,
            location: clean(self.location),
        };
        max_len(Some(&input.service_name), 150, "Service name")?;
        max_len(input.location.as_deref(), 255, "Location")?;
        Ok(input)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Beneficiary {
    pub id: i64,
    pub service_id: i64,
    pub resident_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddBeneficiaryRequest {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub resident_id: Option<i64>,
    pub notes: Option<String>,
}

impl AddBeneficiaryRequest {
    pub fn validate(self) -> AppResult<(i64, Option<String>)> {
        let resident_id = self
            .resident_id
            .ok_or_else(|| AppError::validation("resident_id is required for beneficiary."))?;
        Ok((resident_id, clean(self.notes)))
    }
}
