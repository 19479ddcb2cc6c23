use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Decision, NewUser, User, UserRow, UserStats, UserStatus};
use super::{StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, status, approved_by, approved_at, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, StoreError> {
    row.map(User::try_from).transpose()
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_any_admin(&self) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'admin' ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, status, approved_by, approved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new_user.id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(new_user.status.as_str())
        .bind(new_user.approved_by)
        .bind(new_user.approved_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })?;
        User::try_from(row)
    }

    async fn decide_if_pending(
        &self,
        id: Uuid,
        decision: Decision,
        admin_id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET status = $2, approved_by = $3, approved_at = $4
             WHERE id = $1 AND status = 'pending'
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.status().as_str())
        .bind(admin_id)
        .bind(at)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn list_users(&self, status: Option<UserStatus>) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE role = 'user' AND ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC
            "#
        ))
        .bind(status.map(UserStatus::as_str))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn stats(&self) -> Result<UserStats, StoreError> {
        let (total_users, pending_users, approved_users, rejected_users) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status = 'pending'),
                       COUNT(*) FILTER (WHERE status = 'approved'),
                       COUNT(*) FILTER (WHERE status = 'rejected')
                  FROM users
                 WHERE role = 'user'
                "#,
            )
            .fetch_one(&self.db)
            .await?;
        Ok(UserStats {
            total_users,
            pending_users,
            approved_users,
            rejected_users,
        })
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM users").execute(&self.db).await?;
        Ok(res.rows_affected())
    }
}
