use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{
    de,
    resident::{Resident, ResidentInput, ResidentRequest},
};
use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, one_of, required};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Head,
    Spouse,
    Child,
    Parent,
    Sibling,
    Grandchild,
    Grandparent,
    Other,
    SelfMember,
}

impl Relation {
    pub const ALL: [(&'static str, Relation); 9] = [
        ("Head", Relation::Head),
        ("Spouse", Relation::Spouse),
        ("Child", Relation::Child),
        ("Parent", Relation::Parent),
        ("Sibling", Relation::Sibling),
        ("Grandchild", Relation::Grandchild),
        ("Grandparent", Relation::Grandparent),
        ("Other", Relation::Other),
        ("Self", Relation::SelfMember),
    ];

    pub fn as_str(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, r)| *r == self)
            .map(|(name, _)| *name)
            .unwrap_or("Other")
    }

    /// Blank means "no relation recorded".
    pub fn parse_optional(raw: Option<String>) -> AppResult<Option<Relation>> {
        clean(raw)
            .map(|r| one_of(&r, &Self::ALL, "relation_to_head"))
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Household {
    pub id: i64,
    pub household_name: String,
    pub address: String,
    pub purok: Option<String>,
    /// Declared size; never below the number of linked members after an edit.
    pub num_members: i32,
    /// Linked member rows, computed on read.
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct HouseholdRequest {
    pub household_name: Option<String>,
    pub address: Option<String>,
    pub purok: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub num_members: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdInput {
    pub household_name: String,
    pub address: String,
    pub purok: Option<String>,
    pub num_members: Option<i32>,
}

impl HouseholdRequest {
    pub fn validate(self) -> AppResult<HouseholdInput> {
        let [household_name, address] = required(
            [self.household_name, self.address],
            "household_name and address are required.",
        )?;
        let purok = clean(self.purok);

        max_len(Some(&household_name), 100, "Household name")?;
        max_len(Some(&address), 255, "Address")?;
        max_len(purok.as_deref(), 100, "Purok")?;

        let num_members = match self.num_members {
            Some(n) if n < 0 => {
                return Err(AppError::validation("num_members cannot be negative."))
            }
            Some(n) => Some(i32::try_from(n).map_err(|_| {
                AppError::validation("num_members is too large.")
            })?),
            None => None,
        };

        Ok(HouseholdInput {
            household_name,
            address,
            purok,
            num_members,
        })
    }
}

/// A membership row joined with the resident it points at.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HouseholdMember {
    pub id: i64,
    pub household_id: i64,
    pub resident_id: i64,
    pub relation_to_head: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub sex: String,
    pub birthdate: Option<NaiveDate>,
    pub age: Option<i32>,
    pub civil_status: Option<String>,
    pub employment_status: Option<String>,
    pub registered_voter: Option<String>,
    pub resident_status: String,
    pub is_senior_citizen: bool,
    pub is_pwd: bool,
    pub contact_no: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddMemberRequest {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub resident_id: Option<i64>,
    pub relation_to_head: Option<String>,
}

impl AddMemberRequest {
    pub fn validate(self) -> AppResult<(i64, Option<Relation>)> {
        let resident_id = self
            .resident_id
            .ok_or_else(|| AppError::validation("resident_id is required to add member."))?;
        let relation = Relation::parse_optional(self.relation_to_head).map_err(|_| {
            let names: Vec<&str> = Relation::ALL.iter().map(|(n, _)| *n).collect();
            AppError::validation(format!(
                "Invalid relation_to_head. Must be one of: {}",
                names.join(", ")
            ))
        })?;
        Ok((resident_id, relation))
    }
}

/// One resident entry of the composite create.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HouseholdResidentRequest {
    #[serde(flatten)]
    pub resident: ResidentRequest,
    pub relation_to_head: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HouseholdWithResidentsRequest {
    pub household_name: Option<String>,
    pub address: Option<String>,
    pub purok: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub num_members: Option<i64>,
    pub residents: Option<Vec<HouseholdResidentRequest>>,
}

/// Validated composite create: the household and each resident with its relation.
#[derive(Debug, Clone)]
pub struct HouseholdWithResidentsInput {
    pub household: HouseholdInput,
    pub residents: Vec<(ResidentInput, Option<Relation>)>,
}

impl HouseholdWithResidentsRequest {
    /// Validates everything up front so no statement runs for a bad payload.
    /// Errors name the offending resident by its 1-based position.
    pub fn validate(self, today: NaiveDate) -> AppResult<HouseholdWithResidentsInput> {
        let household = HouseholdRequest {
            household_name: self.household_name,
            address: self.address,
            purok: self.purok,
            num_members: self.num_members,
        }
        .validate()?;

        let entries = self.residents.unwrap_or_default();
        if entries.is_empty() {
            return Err(AppError::validation("At least one resident is required."));
        }

        let mut residents = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            let position = idx + 1;
            let mut resident = entry
                .resident
                .validate(today)
                .map_err(|e| AppError::validation(format!("Resident #{position}: {e}")))?;
            if resident.address.is_none() {
                resident.address = Some(household.address.clone());
            }
            // Unknown relations are dropped rather than failing the batch.
            let relation = Relation::parse_optional(entry.relation_to_head).unwrap_or(None);
            residents.push((resident, relation));
        }

        Ok(HouseholdWithResidentsInput {
            household,
            residents,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HouseholdWithResidents {
    pub household: Household,
    pub residents: Vec<Resident>,
}

/// Declared size after an explicit edit: never below the members actually linked.
pub fn clamp_num_members(requested: Option<i32>, actual: i64) -> i32 {
    let actual = i32::try_from(actual).unwrap_or(i32::MAX);
    requested.map_or(actual, |n| n.max(actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn clamp_never_goes_below_actual_members() {
        assert_eq!(clamp_num_members(Some(1), 2), 2);
        assert_eq!(clamp_num_members(Some(5), 2), 5);
        assert_eq!(clamp_num_members(None, 3), 3);
    }

    #[test]
    fn relation_must_be_in_the_fixed_set() {
        let req = AddMemberRequest {
            resident_id: Some(4),
            relation_to_head: Some("Cousin".into()),
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().starts_with("Invalid relation_to_head. Must be one of: Head,"));

        let req = AddMemberRequest {
            resident_id: Some(4),
            relation_to_head: Some("Self".into()),
        };
        assert_eq!(req.validate().unwrap(), (4, Some(Relation::SelfMember)));
    }

    #[test]
    fn composite_requires_at_least_one_resident() {
        let req: HouseholdWithResidentsRequest = serde_json::from_value(json!({
            "household_name": "Santos", "address": "Purok 1", "residents": []
        }))
        .unwrap();
        let err = req.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "At least one resident is required.");
    }

    #[test]
    fn composite_names_the_failing_resident() {
        let req: HouseholdWithResidentsRequest = serde_json::from_value(json!({
            "household_name": "Santos",
            "address": "Purok 1",
            "residents": [
                { "last_name": "Santos", "first_name": "Ana", "sex": "Female" },
                { "last_name": "Santos", "first_name": "Ben" }
            ]
        }))
        .unwrap();
        let err = req.validate(today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Resident #2: last_name, first_name, and sex are required."
        );
    }

    #[test]
    fn composite_residents_inherit_household_address() {
        let req: HouseholdWithResidentsRequest = serde_json::from_value(json!({
            "household_name": "Santos",
            "address": " 12 Mabini St ",
            "residents": [
                { "last_name": "Santos", "first_name": "Ana", "sex": "Female",
                  "relation_to_head": "Head", "is_pwd": 1 },
                { "last_name": "Santos", "first_name": "Ben", "sex": "Male",
                  "address": "Sitio Malinis", "relation_to_head": "Cousin" }
            ]
        }))
        .unwrap();
        let input = req.validate(today()).unwrap();
        assert_eq!(input.household.num_members, None);
        assert_eq!(input.residents[0].0.address.as_deref(), Some("12 Mabini St"));
        assert_eq!(input.residents[0].1, Some(Relation::Head));
        assert!(input.residents[0].0.is_pwd);
        assert_eq!(input.residents[1].0.address.as_deref(), Some("Sitio Malinis"));
        assert_eq!(input.residents[1].1, None);
    }

    #[test]
    fn negative_member_count_is_rejected() {
        let req = HouseholdRequest {
            household_name: Some("Santos".into()),
            address: Some("Purok 1".into()),
            purok: None,
            num_members: Some(-1),
        };
        assert!(req.validate().is_err());
    }
}
