use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{Role, User, UserStatus};

/// Deciding admin, resolved for the full user listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApproverRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// User as shown to administrators. The credential is never part of it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub approved_by: Option<ApproverRef>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserView {
    pub fn new(user: User, approved_by: Option<ApproverRef>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            approved_by,
            approved_at: user.approved_at,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for ApproverRef {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub user: UserView,
    pub email_sent: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub status: Option<UserStatus>,
}
