use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::models::auth::AuthenticatedUser;
use crate::services::auth::{decode_token, TokenError};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok());
        let token = token_from_header(header)
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("JWT secret not configured")))?;

        decode_token(token, &secret.0).map_err(|e| {
            match e {
                TokenError::Expired => tracing::warn!("JWT error: token expired"),
                TokenError::Invalid => tracing::warn!("JWT error: invalid token"),
            }
            AppError::from(e)
        })
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

/// Accepts `Bearer <token>` or the bare token.
pub fn token_from_header(header: Option<&str>) -> Option<&str> {
    let raw = header?.trim_start();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_and_raw_headers_are_accepted() {
        assert_eq!(token_from_header(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(token_from_header(Some("abc.def")), Some("abc.def"));
        assert_eq!(token_from_header(Some("Bearer ")), None);
        assert_eq!(token_from_header(None), None);
    }
}
