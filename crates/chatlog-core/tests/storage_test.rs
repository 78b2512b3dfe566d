//! Integration tests for storage repositories.
//!
//! Runs every repository operation against an in-memory SQLite database to
//! check the SQL, ordering guarantees and referential integrity.

use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use chatlog_core::{Clock, CoreError, Storage, StorageOptions, TestClock, UserId};

async fn storage_with_clock() -> (Storage, TestClock) {
    let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let storage = Storage::connect("sqlite::memory:", &StorageOptions::default(), &shared)
        .await
        .expect("in-memory storage should open");

    (storage, clock)
}

#[tokio::test]
async fn storage_health_check() {
    let (storage, _clock) = storage_with_clock().await;

    assert!(storage.health_check().await.is_ok());
}

#[tokio::test]
async fn upsert_creates_user_once() {
    let (storage, _clock) = storage_with_clock().await;
    let user_id = UserId::from("U1001");

    let created = storage.users.upsert_user(&user_id, Some("Alice")).await.unwrap();
    assert_eq!(created.user_id, user_id);
    assert_eq!(created.display_name, "Alice");

    storage.users.upsert_user(&user_id, Some("Alice")).await.unwrap();

    assert_eq!(storage.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_refreshes_display_name_but_keeps_created_at() {
    let (storage, clock) = storage_with_clock().await;
    let user_id = UserId::from("U1002");

    let created = storage.users.upsert_user(&user_id, Some("Bob")).await.unwrap();
    clock.advance(Duration::from_secs(3600));
    let refreshed = storage.users.upsert_user(&user_id, Some("Bobby")).await.unwrap();

    assert_eq!(refreshed.display_name, "Bobby");
    assert_eq!(refreshed.created_at, created.created_at);

    let stored = storage.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Bobby");
}

#[tokio::test]
async fn upsert_without_name_keeps_existing_name() {
    let (storage, _clock) = storage_with_clock().await;
    let user_id = UserId::from("U1003");

    storage.users.upsert_user(&user_id, Some("Carol")).await.unwrap();
    let unchanged = storage.users.upsert_user(&user_id, None).await.unwrap();

    assert_eq!(unchanged.display_name, "Carol");
}

#[tokio::test]
async fn upsert_without_name_uses_fallback_for_new_user() {
    let (storage, _clock) = storage_with_clock().await;
    let user_id = UserId::from("U1004");

    let created = storage.users.upsert_user(&user_id, None).await.unwrap();

    assert_eq!(created.display_name, "User U1004");
}

#[tokio::test]
async fn find_by_id_returns_none_for_unknown_user() {
    let (storage, _clock) = storage_with_clock().await;

    let found = storage.users.find_by_id(&UserId::from("missing")).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn list_users_in_insertion_order() {
    let (storage, _clock) = storage_with_clock().await;

    for id in ["Uzz", "Uaa", "Umm"] {
        storage.users.upsert_user(&UserId::from(id), Some(id)).await.unwrap();
    }
    storage.users.upsert_user(&UserId::from("Uzz"), Some("renamed")).await.unwrap();

    let ids: Vec<String> = storage
        .users
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.user_id.0)
        .collect();

    assert_eq!(ids, vec!["Uzz", "Uaa", "Umm"]);
}

#[tokio::test]
async fn insert_message_requires_existing_user() {
    let (storage, _clock) = storage_with_clock().await;

    let result = storage.messages.insert_message(&UserId::from("ghost"), "boo").await;

    assert!(matches!(result, Err(CoreError::ConstraintViolation(_))));
    assert_eq!(storage.messages.count().await.unwrap(), 0);
}

#[tokio::test]
async fn messages_listed_in_insertion_order() {
    let (storage, clock) = storage_with_clock().await;
    let user_id = UserId::from("U2001");
    storage.users.upsert_user(&user_id, Some("Dave")).await.unwrap();

    let first = storage.messages.insert_message(&user_id, "first").await.unwrap();
    clock.advance(Duration::from_secs(1));
    let second = storage.messages.insert_message(&user_id, "second").await.unwrap();
    clock.advance(Duration::from_secs(1));
    let third = storage.messages.insert_message(&user_id, "third").await.unwrap();

    assert!(first.id < second.id && second.id < third.id);
    assert!(first.created_at < second.created_at);

    let texts: Vec<String> = storage
        .messages
        .list_messages(&user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|message| message.text)
        .collect();

    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn list_messages_filters_by_user() {
    let (storage, _clock) = storage_with_clock().await;
    let alice = UserId::from("Ualice");
    let bob = UserId::from("Ubob");
    storage.users.upsert_user(&alice, Some("Alice")).await.unwrap();
    storage.users.upsert_user(&bob, Some("Bob")).await.unwrap();

    storage.messages.insert_message(&alice, "hi from alice").await.unwrap();
    storage.messages.insert_message(&bob, "hi from bob").await.unwrap();
    storage.messages.insert_message(&alice, "bye from alice").await.unwrap();

    let messages = storage.messages.list_messages(&alice).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|message| message.user_id == alice));
    assert_eq!(storage.messages.count_for_user(&bob).await.unwrap(), 1);
    assert_eq!(storage.messages.count().await.unwrap(), 3);
}

#[tokio::test]
async fn list_messages_for_unknown_user_is_empty() {
    let (storage, _clock) = storage_with_clock().await;

    let messages = storage.messages.list_messages(&UserId::from("nobody")).await.unwrap();

    assert!(messages.is_empty());
}

#[tokio::test]
async fn duplicate_texts_are_stored_separately() {
    let (storage, _clock) = storage_with_clock().await;
    let user_id = UserId::from("U3001");
    storage.users.upsert_user(&user_id, Some("Erin")).await.unwrap();

    storage.messages.insert_message(&user_id, "same").await.unwrap();
    storage.messages.insert_message(&user_id, "same").await.unwrap();

    assert_eq!(storage.messages.count_for_user(&user_id).await.unwrap(), 2);
}

#[tokio::test]
async fn file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let url = format!("sqlite://{}", path.display());
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());

    {
        let storage = Storage::connect(&url, &StorageOptions::default(), &clock).await.unwrap();
        let user_id = UserId::from("Upersist");
        storage.users.upsert_user(&user_id, Some("Fay")).await.unwrap();
        storage.messages.insert_message(&user_id, "kept").await.unwrap();
        storage.close().await;
    }

    let reopened = Storage::connect(&url, &StorageOptions::default(), &clock).await.unwrap();
    assert_eq!(reopened.users.count().await.unwrap(), 1);
    assert_eq!(reopened.messages.count().await.unwrap(), 1);
    reopened.close().await;
}
