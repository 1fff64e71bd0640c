use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::de;
use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: i64,
    pub incident_date: NaiveDate,
    pub incident_type: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub complainant_id: Option<i64>,
    /// Free-text fallback when the complainant is not a registered resident.
    pub complainant_name: Option<String>,
    pub respondent_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Incident joined with the names of linked residents, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IncidentListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub incident: Incident,
    pub complainant_first_name: Option<String>,
    pub complainant_last_name: Option<String>,
    pub respondent_first_name: Option<String>,
    pub respondent_last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentRequest {
    #[serde(default, deserialize_with = "de::opt_date")]
    pub incident_date: Option<NaiveDate>,
    pub incident_type: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub complainant_id: Option<i64>,
    pub complainant_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub respondent_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentInput {
    pub incident_date: NaiveDate,
    pub incident_type: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub complainant_id: Option<i64>,
    pub complainant_name: Option<String>,
    pub respondent_id: Option<i64>,
    pub status: String,
}

impl IncidentInput {
    /// Who the incident is about, for the audit line.
    pub fn involving(&self) -> &str {
        match (&self.complainant_name, self.complainant_id) {
            (Some(name), _) => name,
            (None, Some(_)) => "a resident",
            (None, None) => "unknown",
        }
    }
}

impl IncidentRequest {
    pub fn validate(self) -> AppResult<IncidentInput> {
        const MISSING: &str = "incident_date and incident_type are required.";
        let incident_date = self.incident_date.ok_or_else(|| AppError::validation(MISSING))?;
        let [incident_type] = required([self.incident_type], MISSING)?;

        let input = IncidentInput {
            incident_date,
            incident_type,
            location: clean(self.location),
            description: clean(self.description),
            complainant_id: self.complainant_id,
            complainant_name: clean(self.complainant_name),
            respondent_id: self.respondent_id,
            status: clean(self.status).unwrap_or_else(|| "Open".into()),
        };

        max_len(Some(&input.incident_type), 100, "Incident type")?;
        max_len(input.location.as_deref(), 255, "Location")?;
        max_len(input.complainant_name.as_deref(), 200, "Complainant name")?;
        max_len(Some(&input.status), 50, "Status")?;

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_defaults_to_open() {
        let req: IncidentRequest = serde_json::from_value(json!({
            "incident_date": "2026-10-01", "incident_type": "Noise", "complainant_id": "12"
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.status, "Open");
        assert_eq!(input.complainant_id, Some(12));
        assert_eq!(input.involving(), "a resident");
    }

    #[test]
    fn date_and_type_are_required() {
        let req: IncidentRequest =
            serde_json::from_value(json!({ "incident_type": "Noise" })).unwrap();
        assert_eq!(
            req.validate().unwrap_err().to_string(),
            "incident_date and incident_type are required."
        );
    }
}
