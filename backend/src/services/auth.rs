use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{
        auth::{AuthenticatedUser, Claims},
        user::{LoginResponse, NewUser, User, UserProfile},
    },
};

pub const BCRYPT_COST: u32 = 10;

/// Same text for unknown usernames and wrong passwords.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const TOKEN_EXPIRED: &str = "Token expired. Please log in again.";
pub const TOKEN_INVALID: &str = "Invalid or expired token";

/// Why a token was refused. Only the message differs for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl TokenError {
    pub fn message(self) -> &'static str {
        match self {
            TokenError::Expired => TOKEN_EXPIRED,
            TokenError::Invalid => TOKEN_INVALID,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        AppError::Unauthorized(e.message().to_string())
    }
}

pub struct AuthService;

impl AuthService {
    pub async fn register(pool: &PgPool, new_user: NewUser) -> AppResult<UserProfile> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&new_user.username)
                .fetch_one(pool)
                .await?;
        if taken {
            return Err(AppError::Rejected("Username already taken.".into()));
        }

        let password_hash = hash_password(new_user.password).await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, full_name, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.full_name)
        .bind(&new_user.role)
        .fetch_one(pool)
        .await
        .map_err(|e| match AppError::from(e).on_unique_violation("Username already taken.") {
            AppError::Conflict(m) => AppError::Rejected(m),
            other => other,
        })?;

        Ok(user.into())
    }

    pub async fn login(
        pool: &PgPool,
        username: &str,
        password: &str,
        jwt_secret: &str,
        ttl_seconds: u64,
    ) -> AppResult<LoginResponse> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 LIMIT 1")
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let profile = UserProfile::from(user);
        let token = issue_token(&profile, jwt_secret, ttl_seconds)?;
        Ok(LoginResponse {
            token,
            user: profile,
        })
    }
}

/// bcrypt is CPU-bound; run it off the async workers.
async fn hash_password(password: String) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(hash)
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(anyhow::Error::from)?
        // A malformed stored hash is treated as a mismatch.
        .unwrap_or(false);
    Ok(ok)
}

pub fn issue_token(user: &UserProfile, secret: &str, ttl_seconds: u64) -> AppResult<String> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        role: user.role.clone(),
        iat: now,
        exp: now + ttl_seconds as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.into()))
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthenticatedUser, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims.into()),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn clerk() -> UserProfile {
        UserProfile {
            id: 1,
            username: "clerk1".into(),
            full_name: "Juan Dela Cruz".into(),
            role: "Staff".into(),
        }
    }

    fn expired_token() -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            id: 1,
            username: "clerk1".into(),
            full_name: "Juan Dela Cruz".into(),
            role: "Staff".into(),
            iat: now - 25 * 3600,
            exp: now - 3600,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let token = issue_token(&clerk(), SECRET, 86_400).unwrap();
        let user = decode_token(&token, SECRET).unwrap();
        assert_eq!(user.username, "clerk1");
        assert_eq!(user.full_name, "Juan Dela Cruz");
        assert_eq!(user.exp - user.iat, 86_400);
    }

    #[test]
    fn expired_token_is_distinguished() {
        assert_eq!(decode_token(&expired_token(), SECRET).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn garbage_and_wrong_secret_are_invalid() {
        assert_eq!(decode_token("not-a-jwt", SECRET).unwrap_err(), TokenError::Invalid);
        let token = issue_token(&clerk(), "other-secret", 60).unwrap();
        assert_eq!(decode_token(&token, SECRET).unwrap_err(), TokenError::Invalid);
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("pw123456".into()).await.unwrap();
        assert!(verify_password("pw123456".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }
}
