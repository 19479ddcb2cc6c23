//! Runs against a real Postgres: `DATABASE_URL=... cargo test --test pg_store -- --ignored`.
//! Rows use fresh emails so an existing database is left usable.

use cri_accounts::db;
use cri_accounts::users::{Decision, NewUser, PgUserStore, User, UserStatus, UserStore};
use time::OffsetDateTime;
use uuid::Uuid;

async fn store() -> PgUserStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::connect(&url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    PgUserStore::new(pool)
}

fn email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::new_v4().simple())
}

async fn admin(store: &PgUserStore) -> User {
    store
        .create(NewUser::admin("Admin".into(), email("admin"), "h".into()))
        .await
        .unwrap()
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn decision_only_applies_to_pending_rows() {
    let store = store().await;
    let admin = admin(&store).await;
    assert_eq!(admin.approved_by, Some(admin.id));

    let user = store
        .create(NewUser::registration("Pat".into(), email("pat"), "h".into()))
        .await
        .unwrap();

    let at = OffsetDateTime::now_utc();
    let decided = store
        .decide_if_pending(user.id, Decision::Approve, admin.id, at)
        .await
        .unwrap()
        .expect("pending row should be updated");
    assert_eq!(decided.status, UserStatus::Approved);
    assert_eq!(decided.approved_by, Some(admin.id));
    assert!(decided.approved_at.is_some());

    let second = store
        .decide_if_pending(user.id, Decision::Reject, admin.id, OffsetDateTime::now_utc())
        .await
        .unwrap();
    assert!(second.is_none());
    let stored = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.status, UserStatus::Approved);
    assert_eq!(stored.approved_at, decided.approved_at);

    assert!(store
        .decide_if_pending(Uuid::new_v4(), Decision::Approve, admin.id, at)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn status_filter_is_optional() {
    let store = store().await;
    let admin = admin(&store).await;
    let pending = store
        .create(NewUser::registration("P".into(), email("p"), "h".into()))
        .await
        .unwrap();
    let rejected = store
        .create(NewUser::decided("R".into(), email("r"), "h".into(), Decision::Reject, admin.id))
        .await
        .unwrap();

    let only_rejected = store.list_users(Some(UserStatus::Rejected)).await.unwrap();
    assert!(only_rejected.iter().all(|u| u.status == UserStatus::Rejected));
    assert!(only_rejected.iter().any(|u| u.id == rejected.id));
    assert!(!only_rejected.iter().any(|u| u.id == pending.id));

    let everyone = store.list_users(None).await.unwrap();
    assert!(everyone.iter().any(|u| u.id == rejected.id));
    assert!(everyone.iter().any(|u| u.id == pending.id));
    assert!(!everyone.iter().any(|u| u.id == admin.id));
}

#[tokio::test]
#[ignore] // needs DATABASE_URL
async fn terminal_rows_without_decision_data_are_refused() {
    let store = store().await;
    let mut broken = NewUser::registration("X".into(), email("x"), "h".into());
    broken.status = UserStatus::Approved;
    assert!(store.create(broken).await.is_err());
}
