use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, one_of, required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub const ALL: [(&'static str, Sex); 3] = [
        ("Male", Sex::Male),
        ("Female", Sex::Female),
        ("Other", Sex::Other),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Resident {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub sex: String,
    pub birthdate: Option<NaiveDate>,
    /// Cached from `birthdate`; refreshed whenever the row is read.
    pub age: Option<i32>,
    pub civil_status: Option<String>,
    pub employment_status: Option<String>,
    pub registered_voter: Option<String>,
    pub resident_status: String,
    pub is_senior_citizen: bool,
    pub is_pwd: bool,
    pub contact_no: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resident {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

/// First name, middle initial and last name, e.g. "Juan D. Cruz".
pub fn display_name(first: &str, middle: Option<&str>, last: &str) -> String {
    let initial = middle
        .and_then(|m| m.trim().chars().next())
        .map(|c| format!("{c}."));
    [Some(first.trim().to_string()), initial, Some(last.trim().to_string())]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Body of `POST /residents` and `PUT /residents/{id}`. Any client-sent `age` is ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResidentRequest {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub birthdate: Option<NaiveDate>,
    pub civil_status: Option<String>,
    pub employment_status: Option<String>,
    pub registered_voter: Option<String>,
    pub resident_status: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub is_senior_citizen: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub is_pwd: Option<bool>,
    pub contact_no: Option<String>,
    pub address: Option<String>,
}

/// A resident that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentInput {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub sex: Sex,
    pub birthdate: Option<NaiveDate>,
    pub civil_status: Option<String>,
    pub employment_status: Option<String>,
    pub registered_voter: Option<String>,
    pub resident_status: String,
    pub is_senior_citizen: bool,
    pub is_pwd: bool,
    pub contact_no: Option<String>,
    pub address: Option<String>,
}

impl ResidentRequest {
    /// Trims, nulls blanks, checks required fields, ceilings and the `sex` set.
    pub fn validate(self, today: NaiveDate) -> AppResult<ResidentInput> {
        let [last_name, first_name, sex] = required(
            [self.last_name, self.first_name, self.sex],
            "last_name, first_name, and sex are required.",
        )?;
        let sex = one_of(&sex, &Sex::ALL, "sex")?;

        let input = ResidentInput {
            last_name,
            first_name,
            middle_name: clean(self.middle_name),
            suffix: clean(self.suffix),
            nickname: clean(self.nickname),
            sex,
            birthdate: self.birthdate,
            civil_status: clean(self.civil_status),
            employment_status: clean(self.employment_status),
            registered_voter: clean(self.registered_voter),
            resident_status: clean(self.resident_status).unwrap_or_else(|| "Resident".into()),
            is_senior_citizen: self.is_senior_citizen.unwrap_or(false),
            is_pwd: self.is_pwd.unwrap_or(false),
            contact_no: clean(self.contact_no),
            address: clean(self.address),
        };

        max_len(Some(&input.last_name), 100, "Last name")?;
        max_len(Some(&input.first_name), 100, "First name")?;
        max_len(input.middle_name.as_deref(), 100, "Middle name")?;
        max_len(input.suffix.as_deref(), 20, "Suffix")?;
        max_len(input.nickname.as_deref(), 100, "Nickname")?;
        max_len(input.civil_status.as_deref(), 50, "Civil status")?;
        max_len(input.employment_status.as_deref(), 50, "Employment status")?;
        max_len(input.registered_voter.as_deref(), 50, "Registered voter")?;
        max_len(Some(&input.resident_status), 50, "Resident status")?;
        max_len(input.contact_no.as_deref(), 50, "Contact number")?;
        max_len(input.address.as_deref(), 255, "Address")?;

        if input.birthdate.is_some_and(|b| b > today) {
            return Err(AppError::validation("birthdate cannot be in the future."));
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn juan() -> ResidentRequest {
        ResidentRequest {
            last_name: Some("  Dela Cruz ".into()),
            first_name: Some("Juan".into()),
            middle_name: Some("   ".into()),
            sex: Some("Male".into()),
            ..Default::default()
        }
    }

    #[test]
    fn sanitises_and_applies_defaults() {
        let input = juan().validate(today()).unwrap();
        assert_eq!(input.last_name, "Dela Cruz");
        assert_eq!(input.middle_name, None);
        assert_eq!(input.resident_status, "Resident");
        assert!(!input.is_senior_citizen && !input.is_pwd);
    }

    #[test]
    fn unknown_sex_lists_allowed_values() {
        let req = ResidentRequest {
            sex: Some("Unknown".into()),
            ..juan()
        };
        let err = req.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "sex must be one of: Male, Female, Other");
    }

    #[test]
    fn missing_sex_is_required_error() {
        let req = ResidentRequest { sex: None, ..juan() };
        let err = req.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "last_name, first_name, and sex are required.");
    }

    #[test]
    fn address_ceiling_is_enforced() {
        let req = ResidentRequest {
            address: Some("a".repeat(256)),
            ..juan()
        };
        let err = req.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "Address must be 255 characters or less.");
    }

    #[test]
    fn future_birthdate_is_rejected() {
        let req = ResidentRequest {
            birthdate: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..juan()
        };
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn display_name_uses_middle_initial() {
        assert_eq!(display_name("Juan", Some("Santos"), "Dela Cruz"), "Juan S. Dela Cruz");
        assert_eq!(display_name("Juan", None, "Dela Cruz"), "Juan Dela Cruz");
        assert_eq!(display_name("Juan", Some(""), "Dela Cruz"), "Juan Dela Cruz");
    }
}
