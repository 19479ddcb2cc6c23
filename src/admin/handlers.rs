use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{DecisionResponse, UserListQuery, UserView};
use super::services;
use crate::{
    auth::AdminUser,
    envelope::Envelope,
    error::ApiError,
    state::AppState,
    users::{Decision, UserStats, UserStatus},
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/pending-users", get(pending_users))
        .route("/admin/users", get(all_users))
        .route("/admin/approve-user/:user_id", put(approve_user))
        .route("/admin/reject-user/:user_id", put(reject_user))
        .route("/admin/stats", get(dashboard_stats))
        .route("/admin/send-welcome/:user_id", post(send_welcome_email))
}

/// A malformed id can never name a stored user.
fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

#[instrument(skip(state, _admin))]
pub async fn pending_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Envelope<Vec<UserView>>>, ApiError> {
    let users = services::list_users(state.store.as_ref(), Some(UserStatus::Pending)).await?;
    Ok(Json(Envelope::list(users)))
}

#[instrument(skip(state, _admin))]
pub async fn all_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<UserListQuery>,
) -> Result<Json<Envelope<Vec<UserView>>>, ApiError> {
    let users = services::list_users(state.store.as_ref(), q.status).await?;
    Ok(Json(Envelope::list(users)))
}

async fn decide_route(
    state: &AppState,
    admin: &AdminUser,
    raw_id: &str,
    decision: Decision,
) -> Result<Json<Envelope<DecisionResponse>>, ApiError> {
    let user_id = parse_user_id(raw_id)?;
    let decided = services::decide(
        state.store.as_ref(),
        &state.notifier,
        user_id,
        admin.0.id,
        decision,
    )
    .await?;

    let message = match decision {
        Decision::Approve => "User approved successfully",
        Decision::Reject => "User rejected successfully",
    };
    Ok(Json(Envelope::with_message(
        message,
        DecisionResponse {
            user: UserView::new(decided.user, Some((&admin.0).into())),
            email_sent: decided.email_sent,
        },
    )))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn approve_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<Envelope<DecisionResponse>>, ApiError> {
    decide_route(&state, &admin, &user_id, Decision::Approve).await
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn reject_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<Envelope<DecisionResponse>>, ApiError> {
    decide_route(&state, &admin, &user_id, Decision::Reject).await
}

#[instrument(skip(state, _admin))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Envelope<UserStats>>, ApiError> {
    let stats = services::stats(state.store.as_ref()).await?;
    Ok(Json(Envelope::data(stats)))
}

#[instrument(skip(state, _admin))]
pub async fn send_welcome_email(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<Envelope<()>>), ApiError> {
    let user_id = parse_user_id(&user_id)?;
    if services::send_welcome(state.store.as_ref(), &state.notifier, user_id).await? {
        Ok((
            StatusCode::OK,
            Json(Envelope::message("Welcome email sent successfully")),
        ))
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::failure("Failed to send welcome email")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_user_id("not-a-uuid"), Err(ApiError::NotFound)));
        let id = Uuid::new_v4();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
    }
}
