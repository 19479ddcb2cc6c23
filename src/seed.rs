//! Maintenance routines behind the `seed` binary.

use anyhow::Context;
use tracing::info;

use crate::auth::hash_password;
use crate::users::{Decision, NewUser, User, UserStatus, UserStore};

pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            name: "Admin User".into(),
            email: "admin@example.com".into(),
            password: "admin123".into(),
        }
    }
}

#[derive(Debug)]
pub enum AdminSeedOutcome {
    AlreadyExists(User),
    Created(User),
}

/// Creates the admin account unless any admin already exists. The new admin
/// is recorded as its own approver.
pub async fn create_admin(store: &dyn UserStore, seed: AdminSeed) -> anyhow::Result<AdminSeedOutcome> {
    if let Some(existing) = store.find_any_admin().await.context("look up admin")? {
        return Ok(AdminSeedOutcome::AlreadyExists(existing));
    }
    let admin = store
        .create(NewUser::admin(
            seed.name,
            seed.email.trim().to_lowercase(),
            hash_password(&seed.password)?,
        ))
        .await
        .context("create admin")?;
    info!(email = %admin.email, "admin user created");
    Ok(AdminSeedOutcome::Created(admin))
}

const TEST_PASSWORD: &str = "password123";

const TEST_USERS: [(&str, &str, UserStatus); 3] = [
    ("John Doe", "john@example.com", UserStatus::Pending),
    ("Jane Smith", "jane@example.com", UserStatus::Approved),
    ("Bob Johnson", "bob@example.com", UserStatus::Rejected),
];

/// Inserts one sample user per status, skipping emails already present.
/// Approved and rejected samples are recorded as decided by the existing
/// admin, so `create_admin` must have run first.
/// Returns each email with whether it was newly created.
pub async fn create_test_users(store: &dyn UserStore) -> anyhow::Result<Vec<(String, bool)>> {
    let admin = store
        .find_any_admin()
        .await
        .context("look up admin")?
        .context("no admin account exists; run create-admin first")?;

    let mut report = Vec::with_capacity(TEST_USERS.len());
    for (name, email, status) in TEST_USERS {
        if store.find_by_email(email).await?.is_some() {
            info!(email, "test user already exists");
            report.push((email.to_string(), false));
            continue;
        }
        let password_hash = hash_password(TEST_PASSWORD)?;
        let new_user = match status {
            UserStatus::Pending => NewUser::registration(name.into(), email.into(), password_hash),
            UserStatus::Approved => {
                NewUser::decided(name.into(), email.into(), password_hash, Decision::Approve, admin.id)
            }
            UserStatus::Rejected => {
                NewUser::decided(name.into(), email.into(), password_hash, Decision::Reject, admin.id)
            }
        };
        store
            .create(new_user)
            .await
            .with_context(|| format!("create test user {email}"))?;
        info!(email, %status, "test user created");
        report.push((email.to_string(), true));
    }
    Ok(report)
}

pub async fn clear_database(store: &dyn UserStore) -> anyhow::Result<u64> {
    let removed = store.delete_all().await.context("delete users")?;
    info!(removed, "database cleared");
    Ok(removed)
}
