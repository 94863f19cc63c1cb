//! Store over the file gateway: state survives a reopen

use std::sync::Arc;
use taskboard_kanban::{
    FileGateway, GatewayError, Lane, NewTask, PersistenceGateway, ResortOrder, TaskFilter,
    TaskPatch, TaskStore,
};
use tempfile::TempDir;

async fn open(root: &std::path::Path) -> TaskStore {
    let gateway = FileGateway::new(root);
    gateway.create_directories().await.unwrap();
    let store = TaskStore::new(Arc::new(gateway));
    store.load().await.unwrap();
    store
}

#[test_log::test(tokio::test)]
async fn test_board_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join(".taskboard");
    let store = open(&root).await;

    let mut ids = Vec::new();
    for (i, title) in ["Plan", "Build", "Ship"].into_iter().enumerate() {
        let input = NewTask::new(title).with_sort_order(i as i64 * 1000);
        ids.push(store.create(input).await.unwrap());
    }
    store
        .move_task(&ids[2], Lane::Todo, 0)
        .unwrap()
        .unwrap()
        .settled()
        .await;
    store
        .move_task(&ids[0], Lane::Done, 0)
        .unwrap()
        .unwrap()
        .settled()
        .await;
    store
        .update(&ids[1], TaskPatch::new().with_description("cargo build"))
        .unwrap()
        .settled()
        .await;

    let reopened = open(&root).await;
    assert_eq!(reopened.snapshot(), store.snapshot());
    assert_eq!(reopened.snapshot().ids(Lane::Todo), vec![ids[2].clone(), ids[1].clone()]);
    assert!(reopened.get(&ids[0]).unwrap().done_at.is_some());
    assert_eq!(reopened.get(&ids[1]).unwrap().description, "cargo build");
}

#[test_log::test(tokio::test)]
async fn test_archived_tasks_stay_on_disk() {
    let temp = TempDir::new().unwrap();
    let gateway = FileGateway::new(temp.path());
    gateway.create_directories().await.unwrap();
    let store = TaskStore::new(Arc::new(gateway.clone()));

    let id = store.create(NewTask::new("Old idea")).await.unwrap();
    store
        .update(&id, TaskPatch::new().with_archived(true))
        .unwrap()
        .settled()
        .await;

    assert!(store.snapshot().is_empty());
    assert!(gateway.task_path(&id).exists());
    assert!(gateway.list(&TaskFilter::board()).await.unwrap().is_empty());
    assert_eq!(gateway.list(&TaskFilter::all()).await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_delete_of_vanished_file_rolls_back() {
    let temp = TempDir::new().unwrap();
    let gateway = FileGateway::new(temp.path());
    gateway.create_directories().await.unwrap();
    let store = TaskStore::new(Arc::new(gateway.clone()));

    let id = store.create(NewTask::new("Ghost")).await.unwrap();
    // Someone else removed it behind the store's back
    std::fs::remove_file(gateway.task_path(&id)).unwrap();

    let outcome = store.delete(&id).unwrap().settled().await;
    assert!(matches!(
        outcome,
        taskboard_kanban::MutationOutcome::RolledBack {
            error: GatewayError::NotFound { .. },
            resynced: true,
        }
    ));
    // The reload reflects the remote: the task is gone
    assert!(store.get(&id).is_none());
}

#[test_log::test(tokio::test)]
async fn test_resort_persists_keys() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();
    let store = open(&root).await;
    for title in ["cherry", "apple", "banana"] {
        store.create(NewTask::new(title)).await.unwrap();
    }

    store
        .resort_lane(Lane::Todo, ResortOrder::Title)
        .unwrap()
        .unwrap()
        .settled()
        .await;

    let reopened = open(&root).await;
    let titles: Vec<String> = reopened
        .lane(Lane::Todo)
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["apple", "banana", "cherry"]);
}
