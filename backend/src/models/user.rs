use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};
use crate::validation::{clean, max_len, required};

pub const DEFAULT_ROLE: &str = "Staff";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, also the identity embedded in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            full_name: u.full_name,
            role: u.role,
        }
    }
}

// Request/Response DTOs
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

/// A registration that passed validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewUser> {
        // Passwords are taken verbatim; only presence is checked.
        let password = self.password.filter(|p| !p.is_empty());
        let [username, full_name] = required(
            [self.username, self.full_name],
            "username, password, and full_name are required.",
        )?;
        let password = password.ok_or_else(|| {
            AppError::validation("username, password, and full_name are required.")
        })?;
        let role = clean(self.role).unwrap_or_else(|| DEFAULT_ROLE.to_string());

        max_len(Some(&username), 50, "Username")?;
        max_len(Some(&full_name), 100, "Full name")?;
        max_len(Some(&role), 50, "Role")?;

        Ok(NewUser {
            username,
            password,
            full_name,
            role,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str, full_name: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.into()),
            password: Some(password.into()),
            full_name: Some(full_name.into()),
            role: None,
        }
    }

    #[test]
    fn role_defaults_to_staff() {
        let user = request("clerk1", "pw123456", "Juan Dela Cruz").validate().unwrap();
        assert_eq!(user.role, "Staff");
        assert_eq!(user.full_name, "Juan Dela Cruz");
    }

    #[test]
    fn missing_password_is_rejected() {
        let err = request("clerk1", "", "Juan Dela Cruz").validate().unwrap_err();
        assert_eq!(err.to_string(), "username, password, and full_name are required.");
    }

    #[test]
    fn username_ceiling_is_enforced() {
        let err = request(&"u".repeat(51), "pw", "Juan").validate().unwrap_err();
        assert_eq!(err.to_string(), "Username must be 50 characters or less.");
    }
}
