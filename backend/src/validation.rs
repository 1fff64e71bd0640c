//! Input sanitising shared by every create/update path.

use crate::error::{AppError, AppResult};

/// Trims a free-text value; blank becomes `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims every required value and fails with `message` if any is blank.
pub fn required<const N: usize>(
    values: [Option<String>; N],
    message: &str,
) -> AppResult<[String; N]> {
    let cleaned = values.map(clean);
    if cleaned.iter().any(Option::is_none) {
        return Err(AppError::validation(message));
    }
    Ok(cleaned.map(Option::unwrap_or_default))
}

/// Enforces a character ceiling with a message that names the field.
pub fn max_len(value: Option<&str>, limit: usize, label: &str) -> AppResult<()> {
    match value {
        Some(v) if v.chars().count() > limit => Err(AppError::validation(format!(
            "{label} must be {limit} characters or less."
        ))),
        _ => Ok(()),
    }
}

/// Looks `value` up in a closed set, failing with a message that lists the set.
pub fn one_of<T: Copy>(
    value: &str,
    allowed: &[(&'static str, T)],
    field: &str,
) -> AppResult<T> {
    allowed
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            let names: Vec<&str> = allowed.iter().map(|(n, _)| *n).collect();
            AppError::validation(format!("{field} must be one of: {}", names.join(", ")))
        })
}
