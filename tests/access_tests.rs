mod common;

use std::sync::Arc;

use chrono::DateTime;
use serde_json::json;

use taskboard::access::{decode_task, TaskAccess, TASKS_COLLECTION};
use taskboard::error::StoreWriteError;
use taskboard::models::{NewTask, Status, Task, TaskId, UserId};
use taskboard::storage::LocalStore;
use taskboard::store::DocumentStore;

use common::{new_task, WAIT};

/// Current contents of `user`'s task list, read through a live query.
async fn stored_tasks(store: &LocalStore, user: &str) -> Vec<Task> {
    let access = TaskAccess::new(Arc::new(store.clone()));
    let query = access.tasks_query(&UserId(user.into()));
    let mut stream = store.subscribe(&query).await.unwrap();
    let docs = tokio::time::timeout(WAIT, stream.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    docs.into_iter().map(|d| decode_task(d).unwrap()).collect()
}

#[tokio::test]
async fn test_create_stamps_owner_and_creation_time() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let created = access
        .create_task(&new_task("Draft spec", "Alice", "2024-05-01"), &UserId("U1".into()))
        .await
        .unwrap();

    let tasks = stored_tasks(&store, "U1").await;
    assert_eq!(tasks.len(), 1);
    let t = &tasks[0];
    assert_eq!(t.id, created.id);
    assert_eq!(t.name, "Draft spec");
    assert_eq!(t.stakeholder, "Alice");
    assert_eq!(t.due_date, "2024-05-01");
    assert_eq!(t.status, Status::Pending);
    assert_eq!(t.user_id, UserId("U1".into()));
    assert!(DateTime::parse_from_rfc3339(&t.created_at).is_ok());
}

#[tokio::test]
async fn test_caller_cannot_supply_system_fields() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let payload: NewTask = serde_json::from_value(json!({
        "name": "Sneaky",
        "stakeholder": "Mallory",
        "dueDate": "2024-06-01",
        "id": "forged-id",
        "userId": "someone-else",
        "createdAt": "1999-01-01T00:00:00Z"
    }))
    .unwrap();

    let created = access.create_task(&payload, &UserId("U1".into())).await.unwrap();
    assert_ne!(created.id, TaskId("forged-id".into()));

    let tasks = stored_tasks(&store, "U1").await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].user_id, UserId("U1".into()));
    assert_ne!(tasks[0].created_at, "1999-01-01T00:00:00Z");
    assert!(stored_tasks(&store, "someone-else").await.is_empty());
}

#[tokio::test]
async fn test_ids_are_unique() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));
    let user = UserId("U1".into());

    let a = access.create_task(&new_task("A", "Alice", "2024-05-01"), &user).await.unwrap();
    let b = access.create_task(&new_task("A", "Alice", "2024-05-01"), &user).await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_query_is_built_not_run() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let query = access.tasks_query(&UserId("U7".into()));
    assert_eq!(query.collection, TASKS_COLLECTION);
    assert_eq!(query.field, "userId");
    assert_eq!(query.value, "U7");
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_query_only_matches_owner() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));

    access.create_task(&new_task("Mine", "Alice", "2024-05-01"), &UserId("U1".into())).await.unwrap();
    access.create_task(&new_task("Theirs", "Bob", "2024-05-02"), &UserId("U2".into())).await.unwrap();

    let mine = stored_tasks(&store, "U1").await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Mine");
}

#[tokio::test]
async fn test_status_update_touches_only_status() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));
    let created = access
        .create_task(&new_task("Review", "Carol", "2024-05-03"), &UserId("U1".into()))
        .await
        .unwrap();
    let before = stored_tasks(&store, "U1").await.remove(0);

    access.update_task_status(&created.id, Status::Completed).await.unwrap();

    let after = stored_tasks(&store, "U1").await.remove(0);
    assert_eq!(after.status, Status::Completed);
    assert_eq!(Task { status: before.status, ..after }, before);
}

#[tokio::test]
async fn test_status_update_on_missing_task_is_not_found() {
    let store = LocalStore::in_memory();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let err = access
        .update_task_status(&TaskId("gone".into()), Status::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreWriteError::NotFound(ref id) if id == "gone"));
}

#[tokio::test]
async fn test_store_persists_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");

    let store = LocalStore::open(&path).unwrap();
    let access = TaskAccess::new(Arc::new(store.clone()));
    let created = access
        .create_task(&new_task("Persist me", "Dana", "2024-07-01"), &UserId("U1".into()))
        .await
        .unwrap();
    access.update_task_status(&created.id, Status::Incomplete).await.unwrap();
    assert!(path.exists());

    let reopened = LocalStore::open(&path).unwrap();
    let tasks = stored_tasks(&reopened, "U1").await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert_eq!(tasks[0].status, Status::Incomplete);
}

#[tokio::test]
async fn test_failed_write_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    // The parent of the database is a regular file, so every save fails.
    let store = LocalStore::open(blocker.join("tasks.json")).unwrap();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let err = access
        .create_task(&new_task("Lost", "Eve", "2024-05-01"), &UserId("U1".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreWriteError::Io(_)));
    assert!(stored_tasks(&store, "U1").await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_all_land_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = LocalStore::open(&path).unwrap();
    let access = TaskAccess::new(Arc::new(store.clone()));

    let writers: Vec<_> = (0..20)
        .map(|i| {
            let access = access.clone();
            tokio::spawn(async move {
                access
                    .create_task(&new_task(&format!("Task {}", i), "Alice", "2024-05-01"), &UserId("U1".into()))
                    .await
                    .unwrap()
            })
        })
        .collect();
    for w in writers {
        w.await.unwrap();
    }

    let reopened = LocalStore::open(&path).unwrap();
    assert_eq!(stored_tasks(&reopened, "U1").await.len(), 20);
}

#[test]
fn test_open_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(LocalStore::open(&path).is_err());
}

#[test]
fn test_status_parses_only_known_names() {
    assert_eq!("Completed".parse::<Status>().unwrap(), Status::Completed);
    assert_eq!("pending".parse::<Status>().unwrap(), Status::Pending);
    assert!("Done".parse::<Status>().is_err());
    assert!("".parse::<Status>().is_err());
}
