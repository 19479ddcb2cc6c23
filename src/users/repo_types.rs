use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::StoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Account lifecycle flag. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
}

/// Outcome an administrator can pick for a pending user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, UserStatus::Pending)
    }
}

impl Decision {
    pub fn status(self) -> UserStatus {
        match self {
            Decision::Approve => UserStatus::Approved,
            Decision::Reject => UserStatus::Rejected,
        }
    }

    /// Name of the email template sent once the decision is persisted.
    pub fn template(self) -> &'static str {
        match self {
            Decision::Approve => "approval-email",
            Decision::Reject => "rejection-email",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(StoreError::Corrupt(format!("unknown role {other:?}"))),
        }
    }
}

impl FromStr for UserStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "rejected" => Ok(UserStatus::Rejected),
            other => Err(StoreError::Corrupt(format!("unknown status {other:?}"))),
        }
    }
}

/// User record as returned by the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed in JSON
    pub role: Role,
    pub status: UserStatus,
    pub approved_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Raw `users` row; role and status are TEXT columns with CHECK constraints.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            status: r.status.parse()?,
            approved_by: r.approved_by,
            approved_at: r.approved_at,
            created_at: r.created_at,
        })
    }
}

/// Input for inserting a user. The id is chosen up front so an account can
/// record itself as its own approver.
///
/// `approved_by`/`approved_at` are present exactly when `status` is terminal;
/// build values through the constructors to keep that true.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
}

impl NewUser {
    /// Self-service sign-up: a `pending` user awaiting a decision.
    pub fn registration(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role: Role::User,
            status: UserStatus::Pending,
            approved_by: None,
            approved_at: None,
        }
    }

    /// Bootstrap admin account, approved by itself.
    pub fn admin(name: String, email: String, password_hash: String) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name,
            email,
            password_hash,
            role: Role::Admin,
            status: UserStatus::Approved,
            approved_by: Some(id),
            approved_at: Some(OffsetDateTime::now_utc()),
        }
    }

    /// A user created with a decision already taken by `admin_id`.
    pub fn decided(
        name: String,
        email: String,
        password_hash: String,
        decision: Decision,
        admin_id: Uuid,
    ) -> Self {
        Self {
            status: decision.status(),
            approved_by: Some(admin_id),
            approved_at: Some(OffsetDateTime::now_utc()),
            ..Self::registration(name, email, password_hash)
        }
    }
}

/// Counts over non-admin users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub pending_users: i64,
    pub approved_users: i64,
    pub rejected_users: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_and_displays_lowercase() {
        for s in [UserStatus::Pending, UserStatus::Approved, UserStatus::Rejected] {
            assert_eq!(s.to_string().parse::<UserStatus>().unwrap(), s);
        }
        assert!("Approved".parse::<UserStatus>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!UserStatus::Pending.is_terminal());
        assert!(UserStatus::Approved.is_terminal());
        assert!(UserStatus::Rejected.is_terminal());
    }

    #[test]
    fn new_users_carry_decision_data_only_when_terminal() {
        let pending = NewUser::registration("P".into(), "p@example.com".into(), "h".into());
        assert_eq!(pending.status, UserStatus::Pending);
        assert!(pending.approved_by.is_none() && pending.approved_at.is_none());

        let admin = NewUser::admin("A".into(), "a@example.com".into(), "h".into());
        assert_eq!(admin.approved_by, Some(admin.id));
        assert!(admin.approved_at.is_some());

        let rejected = NewUser::decided(
            "R".into(),
            "r@example.com".into(),
            "h".into(),
            Decision::Reject,
            admin.id,
        );
        assert_eq!(rejected.role, Role::User);
        assert_eq!(rejected.status, UserStatus::Rejected);
        assert_eq!(rejected.approved_by, Some(admin.id));
        assert!(rejected.approved_at.is_some());
    }

    #[test]
    fn decision_maps_to_status_and_template() {
        assert_eq!(Decision::Approve.status(), UserStatus::Approved);
        assert_eq!(Decision::Reject.status(), UserStatus::Rejected);
        assert_eq!(Decision::Approve.template(), "approval-email");
        assert_eq!(Decision::Reject.template(), "rejection-email");
    }

    #[test]
    fn user_json_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "John Doe".into(),
            email: "john@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            status: UserStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert_eq!(json["status"], "pending");
        assert_eq!(json["role"], "user");
        assert!(json["approvedBy"].is_null());
    }
}
