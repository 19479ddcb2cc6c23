use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{ApproverRef, UserView};
use crate::error::ApiError;
use crate::notify::{Notifier, WELCOME_TEMPLATE};
use crate::users::{Decision, User, UserStats, UserStatus, UserStore};

/// Outcome of a persisted decision. The transition stands even when the
/// notification could not be delivered.
#[derive(Debug)]
pub struct Decided {
    pub user: User,
    pub email_sent: bool,
}

/// Moves a pending user to the terminal status picked by `decision`, then
/// sends the matching email.
pub async fn decide(
    store: &dyn UserStore,
    notifier: &Notifier,
    user_id: Uuid,
    admin_id: Uuid,
    decision: Decision,
) -> Result<Decided, ApiError> {
    let current = store.find_by_id(user_id).await?.ok_or(ApiError::NotFound)?;
    if current.status.is_terminal() {
        return Err(ApiError::InvalidState(current.status));
    }

    let now = OffsetDateTime::now_utc();
    let user = match store.decide_if_pending(user_id, decision, admin_id, now).await? {
        Some(user) => user,
        None => {
            // another decision landed between the read and the write
            let status = store
                .find_by_id(user_id)
                .await?
                .ok_or(ApiError::NotFound)?
                .status;
            warn!(%user_id, %status, "concurrent decision lost");
            return Err(ApiError::InvalidState(status));
        }
    };
    info!(%user_id, %admin_id, status = %user.status, "user decided");

    let email_sent = notifier
        .notify(decision.template(), &user, &HashMap::new())
        .await;
    if !email_sent {
        warn!(%user_id, "decision email not delivered; status change kept");
    }

    Ok(Decided { user, email_sent })
}

/// Every non-admin user, newest first, optionally narrowed to one status.
pub async fn list_users(
    store: &dyn UserStore,
    status: Option<UserStatus>,
) -> Result<Vec<UserView>, ApiError> {
    let users = store.list_users(status).await?;
    resolve_approvers(store, users).await
}

async fn resolve_approvers(
    store: &dyn UserStore,
    users: Vec<User>,
) -> Result<Vec<UserView>, ApiError> {
    let mut approvers: HashMap<Uuid, Option<ApproverRef>> = HashMap::new();
    for id in users.iter().filter_map(|u| u.approved_by) {
        if !approvers.contains_key(&id) {
            let found = store.find_by_id(id).await?;
            approvers.insert(id, found.as_ref().map(ApproverRef::from));
        }
    }

    Ok(users
        .into_iter()
        .map(|u| {
            let approver = u
                .approved_by
                .and_then(|id| approvers.get(&id).cloned().flatten());
            UserView::new(u, approver)
        })
        .collect())
}

pub async fn stats(store: &dyn UserStore) -> Result<UserStats, ApiError> {
    Ok(store.stats().await?)
}

/// Sends the welcome email; `Ok(false)` means the mail channel failed.
pub async fn send_welcome(
    store: &dyn UserStore,
    notifier: &Notifier,
    user_id: Uuid,
) -> Result<bool, ApiError> {
    let user = store.find_by_id(user_id).await?.ok_or(ApiError::NotFound)?;
    Ok(notifier.notify(WELCOME_TEMPLATE, &user, &HashMap::new()).await)
}
