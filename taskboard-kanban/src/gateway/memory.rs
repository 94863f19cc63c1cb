//! In-process gateway with failure injection.

use super::{GatewayResult, PersistenceGateway, TaskFilter};
use crate::error::GatewayError;
use crate::types::{LanePosition, NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// Gateway entry points, for call recording and failure rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOp {
    List,
    Create,
    Update,
    Delete,
    Reorder,
}

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayCall {
    pub op: GatewayOp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
}

#[derive(Debug)]
struct FailureRule {
    op: GatewayOp,
    id: Option<TaskId>,
    error: GatewayError,
}

impl FailureRule {
    fn matches(&self, op: GatewayOp, id: Option<&TaskId>) -> bool {
        self.op == op && self.id.as_ref().is_none_or(|want| Some(want) == id)
    }
}

/// Gate for the next `list` call
#[derive(Debug, Default)]
struct ListHold {
    gate: Option<Arc<Semaphore>>,
    claimed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: Mutex<BTreeMap<TaskId, Task>>,
    failures: Mutex<Vec<FailureRule>>,
    holds: Mutex<HashMap<TaskId, Arc<Semaphore>>>,
    list_hold: Mutex<ListHold>,
    calls: Mutex<Vec<GatewayCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A gateway that keeps the system of record in memory.
///
/// Cloning shares the same records. Tests use [`fail_next`](Self::fail_next)
/// to script remote failures and [`hold`](Self::hold) to keep a task's writes
/// in flight until [`release`](Self::release) is called.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with remote records
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let gateway = Self::new();
        for task in tasks {
            gateway.insert(task);
        }
        gateway
    }

    /// Write a record directly, bypassing call recording and failure rules
    pub fn insert(&self, task: Task) {
        lock(&self.inner.tasks).insert(task.id.clone(), task);
    }

    /// Remote copy of a record
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        lock(&self.inner.tasks).get(id).cloned()
    }

    /// Every remote record, ordered by id
    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.inner.tasks).values().cloned().collect()
    }

    /// Make the next call of `op` fail with `error`
    pub fn fail_next(&self, op: GatewayOp, error: GatewayError) {
        lock(&self.inner.failures).push(FailureRule {
            op,
            id: None,
            error,
        });
    }

    /// Make the next call of `op` for task `id` fail with `error`
    pub fn fail_next_for(&self, op: GatewayOp, id: impl Into<TaskId>, error: GatewayError) {
        lock(&self.inner.failures).push(FailureRule {
            op,
            id: Some(id.into()),
            error,
        });
    }

    /// Drop every armed failure rule
    pub fn clear_failures(&self) {
        lock(&self.inner.failures).clear();
    }

    /// Block writes to `id` until [`release`](Self::release)
    pub fn hold(&self, id: impl Into<TaskId>) {
        lock(&self.inner.holds).insert(id.into(), Arc::new(Semaphore::new(0)));
    }

    /// Let held writes to `id` proceed
    pub fn release(&self, id: &TaskId) {
        if let Some(gate) = lock(&self.inner.holds).remove(id) {
            gate.close();
        }
    }

    /// Make the next `list` call read the records, then wait for
    /// [`release_list`](Self::release_list) before returning them
    pub fn hold_next_list(&self) {
        *lock(&self.inner.list_hold) = ListHold {
            gate: Some(Arc::new(Semaphore::new(0))),
            claimed: false,
        };
    }

    /// Let a held `list` call return
    pub fn release_list(&self) {
        if let Some(gate) = lock(&self.inner.list_hold).gate.take() {
            gate.close();
        }
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.inner.calls).clone()
    }

    /// Number of calls made to `op`
    pub fn call_count(&self, op: GatewayOp) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|c| c.op == op)
            .count()
    }

    /// Record the call, wait out any hold, then apply failure rules
    async fn enter(&self, op: GatewayOp, id: Option<&TaskId>) -> GatewayResult<()> {
        lock(&self.inner.calls).push(GatewayCall {
            op,
            id: id.cloned(),
        });

        let gate = id.and_then(|id| lock(&self.inner.holds).get(id).cloned());
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal
            let _ = gate.acquire().await;
        }

        let mut failures = lock(&self.inner.failures);
        if let Some(pos) = failures.iter().position(|rule| rule.matches(op, id)) {
            let rule = failures.remove(pos);
            tracing::debug!(?op, ?id, error = %rule.error, "injected gateway failure");
            return Err(rule.error);
        }
        Ok(())
    }

    fn with_task<T>(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> T) -> GatewayResult<T> {
        let mut tasks = lock(&self.inner.tasks);
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })?;
        Ok(f(task))
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn list(&self, filter: &TaskFilter) -> GatewayResult<Vec<Task>> {
        let tasks: Vec<Task> = lock(&self.inner.tasks)
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        let gate = {
            let mut hold = lock(&self.inner.list_hold);
            if hold.claimed {
                None
            } else {
                hold.claimed = true;
                hold.gate.clone()
            }
        };

        self.enter(GatewayOp::List, None).await?;
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
        Ok(tasks)
    }

    async fn create(&self, input: &NewTask) -> GatewayResult<TaskId> {
        self.enter(GatewayOp::Create, None).await?;
        let id = TaskId::new();
        self.insert(Task::from_new(id.clone(), input));
        Ok(id)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        self.enter(GatewayOp::Update, Some(id)).await?;
        self.with_task(id, |task| task.apply_patch(patch))
    }

    async fn delete(&self, id: &TaskId) -> GatewayResult<()> {
        self.enter(GatewayOp::Delete, Some(id)).await?;
        lock(&self.inner.tasks)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound { id: id.to_string() })
    }

    async fn reorder(&self, id: &TaskId, position: &LanePosition) -> GatewayResult<()> {
        self.enter(GatewayOp::Reorder, Some(id)).await?;
        self.with_task(id, |task| task.apply_position(position))
    }
}
