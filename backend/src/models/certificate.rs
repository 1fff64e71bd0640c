use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: i64,
    pub resident_id: i64,
    pub certificate_type: String,
    pub purpose: Option<String>,
    pub issue_date: NaiveDate,
    pub place_issued: Option<String>,
    pub or_number: Option<String>,
    pub amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CertificateListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub certificate: Certificate,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CertificateRequest {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub resident_id: Option<i64>,
    pub certificate_type: Option<String>,
    pub purpose: Option<String>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub issue_date: Option<NaiveDate>,
    pub place_issued: Option<String>,
    pub or_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInput {
    pub resident_id: i64,
    pub certificate_type: String,
    pub purpose: Option<String>,
    pub issue_date: NaiveDate,
    pub place_issued: Option<String>,
    pub or_number: Option<String>,
    pub amount: Option<Decimal>,
}

impl CertificateRequest {
    pub fn validate(self) -> AppResult<CertificateInput> {
        const MISSING: &str = "resident_id, certificate_type, and issue_date are required.";
        let resident_id = self.resident_id.ok_or_else(|| AppError::validation(MISSING))?;
        let issue_date = self.issue_date.ok_or_else(|| AppError::validation(MISSING))?;
        let [certificate_type] = required([self.certificate_type], MISSING)?;

        let input = CertificateInput {
            resident_id,
            certificate_type,
            purpose: clean(self.purpose),
            issue_date,
            place_issued: clean(self.place_issued),
            or_number: clean(self.or_number),
            amount: self.amount,
        };

        max_len(Some(&input.certificate_type), 100, "Certificate type")?;
        max_len(input.place_issued.as_deref(), 255, "Place issued")?;
        max_len(input.or_number.as_deref(), 50, "OR number")?;
        if let Some(amount) = input.amount {
            check_amount(amount)?;
        }

        Ok(input)
    }
}

/// `amount` is stored as NUMERIC(10,2).
fn check_amount(amount: Decimal) -> AppResult<()> {
    if amount.is_sign_negative() {
        return Err(AppError::validation("amount cannot be negative."));
    }
    if amount >= Decimal::from(100_000_000) {
        return Err(AppError::validation("amount must be less than 100,000,000."));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::validation("amount can have at most 2 decimal places."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_form_shaped_payload() {
        let req: CertificateRequest = serde_json::from_value(json!({
            "resident_id": "7",
            "certificate_type": "Barangay Clearance",
            "issue_date": "2026-10-15",
            "amount": "50",
            "or_number": ""
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.resident_id, 7);
        assert_eq!(input.amount, Some(Decimal::from(50)));
        assert_eq!(input.or_number, None);
    }

    #[test]
    fn issue_date_is_required() {
        let req = CertificateRequest {
            resident_id: Some(7),
            certificate_type: Some("Certificate of Indigency".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    fn with_amount(amount: &str) -> CertificateRequest {
        CertificateRequest {
            resident_id: Some(7),
            certificate_type: Some("Barangay Clearance".into()),
            issue_date: NaiveDate::from_ymd_opt(2026, 10, 15),
            amount: Some(amount.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn amount_must_fit_the_column() {
        let err = with_amount("100000000").validate().unwrap_err();
        assert_eq!(err.to_string(), "amount must be less than 100,000,000.");
        assert!(with_amount("99999999.99").validate().is_ok());
    }

    #[test]
    fn amount_rejects_sub_centavo_precision() {
        let err = with_amount("12.345").validate().unwrap_err();
        assert_eq!(err.to_string(), "amount can have at most 2 decimal places.");
        assert!(with_amount("12.500").validate().is_ok());
    }
}
