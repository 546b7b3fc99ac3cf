use std::sync::Arc;

use lesson_core::model::{AppState, LessonId, SessionToken, UserDraft, UserId};
use lesson_core::time::fixed_now;
use storage::sqlite::SqliteRepository;
use storage::{STATE_SLOT_KEY, SlotRepository, StateSnapshotStore, Storage};

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_slot_upserts_and_deletes() {
    let repo = connect("memdb_slots").await;

    assert_eq!(repo.read_slot("k").await.unwrap(), None);
    repo.write_slot("k", "first").await.unwrap();
    repo.write_slot("k", "second").await.unwrap();
    assert_eq!(repo.read_slot("k").await.unwrap().as_deref(), Some("second"));

    repo.delete_slot("k").await.unwrap();
    assert_eq!(repo.read_slot("k").await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.write_slot("k", "kept").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.read_slot("k").await.unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn sqlite_snapshot_round_trip() {
    let repo = connect("memdb_snapshot").await;
    let store = StateSnapshotStore::new(Arc::new(repo.clone()));

    let mut state = AppState::default();
    let user = UserDraft::new("Grace", "grace@example.com")
        .validate(UserId::new("user_grace"))
        .unwrap();
    state.sign_in(user, SessionToken::new("session_grace"));
    state.record_hint_usage(&LessonId::new("css-flexbox-1"));
    state.record_completion(&LessonId::new("js-arrays-1"), 1, 190, fixed_now());

    store.save(&state).await.unwrap();
    assert!(repo.read_slot(STATE_SLOT_KEY).await.unwrap().is_some());
    assert_eq!(store.load().await.unwrap(), state);

    store.erase().await.unwrap();
    assert_eq!(store.load().await.unwrap(), AppState::default());
}

#[tokio::test]
async fn storage_sqlite_builds_migrated_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.slots.write_slot("k", "v").await.unwrap();
    assert_eq!(storage.slots.read_slot("k").await.unwrap().as_deref(), Some("v"));
}
