use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod repo;
pub mod repo_types;

pub use memory::MemoryUserStore;
pub use repo::PgUserStore;
pub use repo_types::{Decision, NewUser, Role, User, UserStats, UserStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("corrupt user row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user accounts. The store exclusively owns user records;
/// callers only ever get owned snapshots back.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_any_admin(&self) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Applies `decision` only if the user is still `pending`, in a single
    /// conditional write. Returns `None` when no pending user matched.
    async fn decide_if_pending(
        &self,
        id: Uuid,
        decision: Decision,
        admin_id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<User>, StoreError>;

    /// Non-admin users, newest first, optionally filtered by status.
    async fn list_users(&self, status: Option<UserStatus>) -> Result<Vec<User>, StoreError>;

    async fn stats(&self) -> Result<UserStats, StoreError>;

    /// Maintenance only: wipes every record, admins included.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}
