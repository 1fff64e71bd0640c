//! Lenient field decoders for request bodies.
//!
//! Browser forms send checkboxes as `0/1`, numeric ids as strings and dates either
//! as `YYYY-MM-DD` or as a full ISO timestamp. These helpers accept those shapes and
//! treat an empty string the same as an absent field. Use them together with
//! `#[serde(default)]` on `Option` fields.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

/// Interprets the usual textual spellings of a boolean.
pub fn truthy(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => truthy(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a boolean, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got {other}"))),
    }
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {other}"))),
    }
}

/// Parses `YYYY-MM-DD`, ignoring any time part that follows.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a date (YYYY-MM-DD), got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected a date, got {other}"))),
    }
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an amount, got {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s.trim())
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an amount, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("expected an amount, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "opt_i64")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "opt_date")]
        day: Option<NaiveDate>,
        #[serde(default, deserialize_with = "opt_decimal")]
        amount: Option<Decimal>,
    }

    fn probe(value: serde_json::Value) -> Probe {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn absent_and_empty_fields_are_none() {
        let p = probe(json!({ "flag": "", "count": "", "day": "" }));
        assert!(p.flag.is_none() && p.count.is_none() && p.day.is_none() && p.amount.is_none());
    }

    #[test]
    fn form_encodings_are_accepted() {
        let p = probe(json!({ "flag": 1, "count": "3", "day": "1990-05-17T00:00:00.000Z", "amount": "50.00" }));
        assert_eq!(p.flag, Some(true));
        assert_eq!(p.count, Some(3));
        assert_eq!(p.day, NaiveDate::from_ymd_opt(1990, 5, 17));
        assert_eq!(p.amount, Some(Decimal::new(5000, 2)));

        let p = probe(json!({ "flag": "0", "count": 7, "amount": 25.5 }));
        assert_eq!(p.flag, Some(false));
        assert_eq!(p.count, Some(7));
        assert_eq!(p.amount, Some(Decimal::new(255, 1)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_value::<Probe>(json!({ "count": "abc" })).is_err());
        assert!(serde_json::from_value::<Probe>(json!({ "day": "17/05/1990" })).is_err());
        assert!(serde_json::from_value::<Probe>(json!({ "flag": "maybe" })).is_err());
    }
}
