use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AccountView, LoginRequest, RefreshRequest, RegisterRequest, Session},
        services::{authenticate, hash_password, is_valid_email, normalize_email, ActiveUser},
        tokens::TokenKind,
    },
    envelope::Envelope,
    error::ApiError,
    state::AppState,
    users::{NewUser, StoreError},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(get_me))
}

const MIN_PASSWORD_LEN: usize = 8;

/// Trimmed name and normalized email of an acceptable sign-up.
fn validate_signup(req: &RegisterRequest) -> Result<(String, String), ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password too short".into()));
    }
    Ok((name.to_string(), email))
}

/// Creates a `pending` account; no tokens until an admin approves it.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<AccountView>>), ApiError> {
    let (name, email) = validate_signup(&payload)?;
    let password_hash = hash_password(&payload.password)?;

    let user = state
        .store
        .create(NewUser::registration(name, email, password_hash))
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => ApiError::Conflict("Email already registered".into()),
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            "Registration successful. Your account is awaiting admin approval.",
            AccountView::from(&user),
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<Session>>, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let user = authenticate(state.store.as_ref(), &email, &payload.password).await?;
    let session = state.tokens.issue(&user)?;
    info!(user_id = %user.id, %email, "user logged in");
    Ok(Json(Envelope::data(session)))
}

/// Trades a refresh token for a new pair, re-checking the stored account.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Envelope<Session>>, ApiError> {
    let user_id = state
        .tokens
        .subject(&payload.refresh_token, TokenKind::Refresh)?;
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(Envelope::data(state.tokens.issue(&user)?)))
}

#[instrument(skip_all)]
pub async fn get_me(ActiveUser(user): ActiveUser) -> Json<Envelope<AccountView>> {
    Json(Envelope::data(AccountView::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn rejection(req: RegisterRequest) -> String {
        match validate_signup(&req) {
            Err(ApiError::BadRequest(msg)) => msg,
            other => panic!("expected a 400, got {other:?}"),
        }
    }

    #[test]
    fn signup_is_trimmed_and_normalized() {
        let (name, email) =
            validate_signup(&signup("  John Doe ", " John@Example.com", "password123")).unwrap();
        assert_eq!(name, "John Doe");
        assert_eq!(email, "john@example.com");
    }

    #[test]
    fn signup_rejections_name_the_problem() {
        assert_eq!(rejection(signup("   ", "a@b.co", "password123")), "Name is required");
        assert_eq!(rejection(signup("A", "not-an-email", "password123")), "Invalid email");
        assert_eq!(rejection(signup("A", "a@b.co", "1234567")), "Password too short");
    }
}
