use crate::errors::ApiError;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const JWT_EXPIRY_DURATION: time::Duration = time::Duration::days(90);

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// Strict identity: extraction fails with a 401 when the token is missing or
/// does not verify.
pub struct AuthUser {
    pub id: i64,
    pub token: String,
}

/// Soft identity: a missing token extracts as `None`, a present-but-invalid
/// token is still a 401.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

/// Token precedence: `token` cookie first, then `Authorization: Bearer`.
fn extract_token(parts: &Parts) -> Result<Option<String>, ApiError> {
    if let Some(cookies) = parts.headers.get(COOKIE) {
        let cookies = cookies
            .to_str()
            .map_err(|_| ApiError::AuthenticationInvalid("Invalid token"))?;
        for cookie in cookies.split(';') {
            if let Some(token) = cookie.trim().strip_prefix("token=") {
                return Ok(Some(token.to_string()));
            }
        }
    }
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(header) => header,
        None => return Ok(None),
    };
    let header = header
        .to_str()
        .map_err(|_| ApiError::AuthenticationInvalid("Invalid token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::AuthenticationInvalid("Invalid token"))?;
    Ok(Some(token.to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = ApiError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = match extract_token(parts)? {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };
        let id = verify_jwt_token(&token)?;
        Ok(MaybeUser(Some(AuthUser { id, token })))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = ApiError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(maybe_user) = MaybeUser::from_request_parts(parts, state).await?;
        maybe_user.ok_or(ApiError::AuthenticationMissing)
    }
}

pub fn get_jwt_token(id: i64) -> Result<String> {
    let jwt_secret = std::env::var("JWT_SECRET").context("Failed to get JWT_SECRET")?;
    let expiry_date = OffsetDateTime::now_utc() + JWT_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(token: &str) -> Result<i64, ApiError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ApiError::ServerError)?;
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("token verification failed: {}", e);
        ApiError::AuthenticationInvalid("Invalid token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(ApiError::AuthenticationInvalid("Token expired"));
    }
    Ok(claim.id)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
