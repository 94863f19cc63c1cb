//! After any failed write the cache matches a fresh canonical read

use std::sync::Arc;
use taskboard_kanban::gateway::GatewayOp;
use taskboard_kanban::store::MutationKind;
use taskboard_kanban::{
    GatewayError, Lane, MemoryGateway, MutationOutcome, PersistenceGateway, SortKey, StoreEvent,
    Task, TaskFilter, TaskId, TaskPatch, TaskStore,
};
use tokio::sync::broadcast;

fn task(id: &str, lane: Lane, key: i64) -> Task {
    Task::new(id.to_uppercase(), lane).with_id(id).with_sort_order(key)
}

async fn board() -> (MemoryGateway, TaskStore) {
    let gateway = MemoryGateway::with_tasks([
        task("a", Lane::Todo, 1000),
        task("b", Lane::Todo, 2000),
        task("c", Lane::InProgress, 1000),
    ]);
    let store = TaskStore::new(Arc::new(gateway.clone()));
    store.load().await.unwrap();
    (gateway, store)
}

async fn assert_matches_remote(gateway: &MemoryGateway, store: &TaskStore) {
    let canonical = gateway.list(&TaskFilter::board()).await.unwrap();
    assert_eq!(store.tasks(), canonical);
}

fn failures(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<(MutationKind, TaskId)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let StoreEvent::MutationFailed { kind, task_id, .. } = event {
            out.push((kind, task_id));
        }
    }
    out
}

#[test_log::test(tokio::test)]
async fn test_failed_move_reverts_and_notifies() {
    let (gateway, store) = board().await;
    let mut events = store.subscribe();
    let c = TaskId::from("c");
    gateway.fail_next(GatewayOp::Reorder, GatewayError::Timeout { elapsed_ms: 5000 });

    let pending = store.move_task(&c, Lane::Todo, 1).unwrap().unwrap();
    assert_eq!(store.get(&c).unwrap().status, Lane::Todo);

    let outcome = pending.settled().await;
    assert!(matches!(
        outcome,
        MutationOutcome::RolledBack {
            error: GatewayError::Timeout { .. },
            resynced: true
        }
    ));
    assert_eq!(store.get(&c).unwrap().status, Lane::InProgress);
    assert_matches_remote(&gateway, &store).await;
    assert_eq!(failures(&mut events), vec![(MutationKind::Reorder, c)]);
}

#[test_log::test(tokio::test)]
async fn test_failed_archive_reverts() {
    let (gateway, store) = board().await;
    let a = TaskId::from("a");
    gateway.fail_next(GatewayOp::Update, GatewayError::unavailable("offline"));

    let pending = store
        .update(&a, TaskPatch::new().with_archived(true))
        .unwrap();
    assert!(store.snapshot().locate(&a).is_none());

    assert!(pending.settled().await.is_rolled_back());
    assert_eq!(store.snapshot().locate(&a), Some((Lane::Todo, 0)));
    assert_matches_remote(&gateway, &store).await;
}

#[test_log::test(tokio::test)]
async fn test_failed_delete_reverts() {
    let (gateway, store) = board().await;
    let b = TaskId::from("b");
    gateway.fail_next(GatewayOp::Delete, GatewayError::PermissionDenied {
        message: "read-only board".into(),
    });

    let pending = store.delete(&b).unwrap();
    assert!(pending.settled().await.is_rolled_back());
    assert_eq!(store.snapshot().locate(&b), Some((Lane::Todo, 1)));
    assert_matches_remote(&gateway, &store).await;
}

#[test_log::test(tokio::test)]
async fn test_failed_rebalance_reverts_every_sibling() {
    let gateway = MemoryGateway::with_tasks([
        task("a", Lane::Todo, 10),
        task("b", Lane::Todo, 11),
        task("x", Lane::Review, 0),
    ]);
    let store = TaskStore::new(Arc::new(gateway.clone()));
    store.load().await.unwrap();
    gateway.fail_next_for(GatewayOp::Reorder, "b", GatewayError::unavailable("offline"));

    let pending = store
        .move_task(&TaskId::from("x"), Lane::Todo, 1)
        .unwrap()
        .unwrap();
    assert!(pending.settled().await.is_rolled_back());

    // The write for x landed before b's failed; the reload shows exactly that
    assert_matches_remote(&gateway, &store).await;
    assert_eq!(store.get(&TaskId::from("b")).unwrap().key(), SortKey::new(11));
}

#[test_log::test(tokio::test)]
async fn test_concurrent_mutations_settle_to_remote_state() {
    let (gateway, store) = board().await;
    let a = TaskId::from("a");
    let b = TaskId::from("b");
    let c = TaskId::from("c");

    gateway.hold(a.clone());
    gateway.fail_next_for(GatewayOp::Update, c.clone(), GatewayError::unavailable("offline"));

    let rename_a = store.update(&a, TaskPatch::new().with_title("A2")).unwrap();
    let move_b = store.reorder(&b, Lane::Review, SortKey::new(100)).unwrap();
    let rename_c = store.update(&c, TaskPatch::new().with_title("C2")).unwrap();

    assert!(move_b.settled().await.is_confirmed());
    assert!(rename_c.settled().await.is_rolled_back());

    gateway.release(&a);
    assert!(rename_a.settled().await.is_confirmed());

    assert_eq!(store.get(&a).unwrap().title, "A2");
    assert_eq!(store.get(&b).unwrap().status, Lane::Review);
    assert_eq!(store.get(&c).unwrap().title, "C");
    assert_matches_remote(&gateway, &store).await;
}

#[test_log::test(tokio::test)]
async fn test_nothing_blocks_on_the_remote() {
    let (gateway, store) = board().await;
    let a = TaskId::from("a");
    gateway.hold(a.clone());

    let pending = store.move_task(&a, Lane::Review, 0).unwrap().unwrap();
    assert!(!pending.is_settled());
    assert_eq!(store.snapshot().locate(&a), Some((Lane::Review, 0)));
    assert_eq!(gateway.get(&a).unwrap().status, Lane::Todo);

    gateway.release(&a);
    assert!(pending.settled().await.is_confirmed());
    assert_matches_remote(&gateway, &store).await;
}
