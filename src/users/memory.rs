use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Decision, NewUser, Role, User, UserStats, UserStatus};
use super::{StoreError, UserStore};

/// In-process store used by tests and database-less local runs.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_any_admin(&self) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.role == Role::Admin).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: new_user.id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            status: new_user.status,
            approved_by: new_user.approved_by,
            approved_at: new_user.approved_at,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn decide_if_pending(
        &self,
        id: Uuid,
        decision: Decision,
        admin_id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users
            .iter_mut()
            .find(|u| u.id == id && u.status == UserStatus::Pending)
        else {
            return Ok(None);
        };
        user.status = decision.status();
        user.approved_by = Some(admin_id);
        user.approved_at = Some(at);
        Ok(Some(user.clone()))
    }

    async fn list_users(&self, status: Option<UserStatus>) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        // insertion order is creation order, so reversing gives newest first
        // even when two records share a timestamp
        Ok(users
            .iter()
            .rev()
            .filter(|u| u.role == Role::User)
            .filter(|u| status.map_or(true, |s| u.status == s))
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<UserStats, StoreError> {
        let users = self.users.read().await;
        let mut stats = UserStats::default();
        for user in users.iter().filter(|u| u.role == Role::User) {
            stats.total_users += 1;
            match user.status {
                UserStatus::Pending => stats.pending_users += 1,
                UserStatus::Approved => stats.approved_users += 1,
                UserStatus::Rejected => stats.rejected_users += 1,
            }
        }
        Ok(stats)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let n = users.len() as u64;
        users.clear();
        Ok(n)
    }
}
