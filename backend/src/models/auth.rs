use serde::{Deserialize, Serialize};

/// Claims embedded in the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated token; available via Axum extractors
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

impl From<Claims> for AuthenticatedUser {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            username: c.username,
            full_name: c.full_name,
            role: c.role,
            iat: c.iat,
            exp: c.exp,
        }
    }
}
