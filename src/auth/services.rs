use argon2::{
    password_hash::{self, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::warn;

use super::tokens::TokenKind;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{User, UserStatus, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("parse stored password hash: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("verify password: {e}")),
    }
}

/// Only approved accounts may hold or use tokens.
pub(crate) fn ensure_active(user: &User) -> Result<(), ApiError> {
    match user.status {
        UserStatus::Approved => Ok(()),
        UserStatus::Pending => Err(ApiError::Forbidden("Account is pending approval".into())),
        UserStatus::Rejected => Err(ApiError::Forbidden("Account has been rejected".into())),
    }
}

/// Checks a login attempt. Unknown emails and wrong passwords look the same
/// to the caller; the account status is checked only after the password.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());

    let Some(user) = store.find_by_email(email).await? else {
        warn!(email, "login for unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(email, user_id = %user.id, "login with wrong password");
        return Err(invalid());
    }
    ensure_active(&user)?;
    Ok(user)
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))
}

/// Caller with a valid access token whose account still exists and is
/// approved. The record is re-read on every request.
pub struct ActiveUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = state.tokens.subject(bearer_token(parts)?, TokenKind::Access)?;
        let user = state.store.find_by_id(user_id).await?.ok_or_else(|| {
            warn!(%user_id, "token for a missing account");
            ApiError::Unauthorized("User not found".into())
        })?;
        ensure_active(&user)?;
        Ok(ActiveUser(user))
    }
}

/// Active caller whose stored role is `admin`.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ActiveUser(user) = ActiveUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            warn!(user_id = %user.id, "admin route denied");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
