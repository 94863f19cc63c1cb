//! TaskStore - the board's task cache and its optimistic mutation contract
//!
//! Every mutation follows the same reconciliation steps:
//!
//! 1. apply the change to the cache synchronously and hand back a
//!    [`PendingMutation`];
//! 2. issue the remote write in the background;
//! 3. on success, leave the cache alone (the optimistic guess was right);
//! 4. on failure, restore the records the mutation touched, replace the
//!    whole cache with a canonical `list()` read, and publish
//!    [`StoreEvent::MutationFailed`].
//!
//! Mutations are neither queued nor merged. A rollback's reload can discard
//! other local edits whose writes have not confirmed yet; the cache then
//! matches the remote, which is the point.

use super::events::{MutationKind, StoreEvent};
use super::pending::{MutationOutcome, PendingMutation};
use crate::config::BoardConfig;
use crate::drag::DropOutcome;
use crate::error::{BoardError, GatewayError, Result};
use crate::gateway::{GatewayResult, PersistenceGateway, TaskFilter};
use crate::logging::Pretty;
use crate::ordering::{BoardSnapshot, SortKeyAllocator};
use crate::types::{Lane, LanePosition, NewTask, SortKey, Task, TaskId, TaskPatch};
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

/// Order applied by [`TaskStore::resort_lane`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResortOrder {
    /// Case-insensitive title, A to Z
    Title,
    /// Oldest first
    CreatedAt,
    /// Flip the current order
    Reverse,
}

struct StoreInner {
    gateway: Arc<dyn PersistenceGateway>,
    cache: RwLock<BTreeMap<TaskId, Task>>,
    allocator: SortKeyAllocator,
    filter: TaskFilter,
    events: broadcast::Sender<StoreEvent>,
    /// Bumped when a canonical read starts and again when it ends
    epoch: AtomicU64,
    /// Ticket of the newest canonical read applied to the cache; only
    /// changed while the cache write lock is held
    applied: AtomicU64,
    resyncs_in_flight: AtomicUsize,
    resync_on_confirm: bool,
}

/// In-memory task cache; the only writer of board state.
///
/// Cloning is cheap and shares the same cache. Mutating methods spawn their
/// remote write on the current tokio runtime, so they must be called from
/// within one.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.len())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

impl TaskStore {
    /// Create an empty store with default settings. Call [`load`](Self::load)
    /// to fill the cache.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self::with_config(gateway, &BoardConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn PersistenceGateway>, config: &BoardConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(StoreInner {
                gateway,
                cache: RwLock::new(BTreeMap::new()),
                allocator: SortKeyAllocator::new(config.gap),
                filter: TaskFilter::board(),
                events,
                epoch: AtomicU64::new(0),
                applied: AtomicU64::new(0),
                resyncs_in_flight: AtomicUsize::new(0),
                resync_on_confirm: config.resync_on_confirm,
            }),
        }
    }

    /// Receive store notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn allocator(&self) -> SortKeyAllocator {
        self.inner.allocator
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached copy of a task
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.read().get(id).cloned()
    }

    /// Every cached task, ordered by id
    pub fn tasks(&self) -> Vec<Task> {
        self.read().values().cloned().collect()
    }

    /// The board in display order
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_tasks(self.read().values())
    }

    /// Tasks of one lane in display order
    pub fn lane(&self, lane: Lane) -> Vec<Task> {
        self.snapshot().lane(lane).to_vec()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Replace the cache with a canonical read. Returns the number of tasks.
    pub async fn load(&self) -> Result<usize> {
        Ok(self.resync().await?)
    }

    /// Reload the cache from the remote.
    ///
    /// Reads can overlap. Each takes a ticket when it starts, and a read that
    /// finishes after a newer one has been applied is dropped, so the cache
    /// never goes back to an older snapshot.
    async fn resync(&self) -> GatewayResult<usize> {
        self.inner.resyncs_in_flight.fetch_add(1, Ordering::SeqCst);
        let ticket = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let listed = self.inner.gateway.list(&self.inner.filter).await;
        let applied = listed.as_ref().ok().map(|tasks| {
            let mut cache = self.write();
            if ticket <= self.inner.applied.load(Ordering::SeqCst) {
                return false;
            }
            *cache = tasks.iter().map(|t| (t.id.clone(), t.clone())).collect();
            self.inner.applied.store(ticket, Ordering::SeqCst);
            true
        });

        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.resyncs_in_flight.fetch_sub(1, Ordering::SeqCst);

        let count = listed?.len();
        if applied == Some(true) {
            info!(count, "board synced from remote");
            trace!("board after sync: {}", Pretty(self.snapshot()));
            self.emit(StoreEvent::Synced { count });
        } else {
            debug!(ticket, "newer reload already applied, dropping stale read");
        }
        Ok(count)
    }

    /// Whether a reload may have replaced the cache with a read taken before
    /// a write dispatched at `epoch` landed
    fn reloaded_since(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) != epoch
            || self.inner.resyncs_in_flight.load(Ordering::SeqCst) > 0
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a task. Not optimistic: the task appears in the cache only once
    /// the remote has accepted it.
    pub async fn create(&self, input: NewTask) -> Result<TaskId> {
        match self.inner.gateway.create(&input).await {
            Ok(id) => {
                debug!(%id, title = %input.title, "task created");
                self.write()
                    .insert(id.clone(), Task::from_new(id.clone(), &input));
                self.emit(StoreEvent::MutationConfirmed {
                    kind: MutationKind::Create,
                    task_id: id.clone(),
                });
                Ok(id)
            }
            Err(error) => {
                warn!(%error, title = %input.title, "task creation failed");
                self.emit(StoreEvent::CreateFailed {
                    title: input.title.clone(),
                    message: error.to_string(),
                });
                Err(error.into())
            }
        }
    }

    /// Apply `patch` to a task now; write it to the remote in the background
    pub fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<PendingMutation> {
        let previous = {
            let mut cache = self.write();
            let task = cache.get_mut(id).ok_or_else(|| BoardError::task_not_found(id))?;
            let previous = task.clone();
            task.apply_patch(&patch);
            previous
        };
        debug!(%id, ?patch, "optimistic update");

        let gateway = Arc::clone(&self.inner.gateway);
        let remote_id = id.clone();
        Ok(self.dispatch(MutationKind::Update, id.clone(), vec![previous], async move {
            gateway.update(&remote_id, &patch).await
        }))
    }

    /// Remove a task from the cache now; delete it remotely in the background
    pub fn delete(&self, id: &TaskId) -> Result<PendingMutation> {
        let removed = self
            .write()
            .remove(id)
            .ok_or_else(|| BoardError::task_not_found(id))?;
        debug!(%id, "optimistic delete");

        let gateway = Arc::clone(&self.inner.gateway);
        let remote_id = id.clone();
        Ok(self.dispatch(MutationKind::Delete, id.clone(), vec![removed], async move {
            gateway.delete(&remote_id).await
        }))
    }

    /// Set a task's lane and sort key in one step.
    ///
    /// Entering the terminal lane stamps `done_at`; leaving it clears the
    /// stamp. Both happen in the same write as the status change.
    pub fn reorder(&self, id: &TaskId, status: Lane, sort_order: SortKey) -> Result<PendingMutation> {
        let task = self.get(id).ok_or_else(|| BoardError::task_not_found(id))?;
        let position = LanePosition::for_move(&task, status, sort_order, Utc::now());
        self.apply_positions(MutationKind::Reorder, id.clone(), vec![(id.clone(), position)])
    }

    /// Move a task to `index` of `lane`, where `index` counts positions in the
    /// lane without the moved task.
    ///
    /// Returns `None` when the move would not change anything visible: the
    /// task is already at that slot, or it is being moved within the terminal
    /// lane, whose order follows completion time.
    pub fn move_task(
        &self,
        id: &TaskId,
        lane: Lane,
        index: usize,
    ) -> Result<Option<PendingMutation>> {
        let task = self.get(id).ok_or_else(|| BoardError::task_not_found(id))?;
        let snapshot = self.snapshot();
        let mut siblings: Vec<Task> = snapshot
            .lane(lane)
            .iter()
            .filter(|t| &t.id != id)
            .cloned()
            .collect();
        // The terminal lane ignores the requested index
        if !lane.is_terminal() && index > siblings.len() {
            return Err(BoardError::InsertionIndexOutOfRange {
                index,
                len: siblings.len(),
            });
        }

        if task.status == lane {
            let current = snapshot.locate(id).map(|(_, i)| i);
            if lane.is_terminal() || current == Some(index) {
                trace!(%id, %lane, index, "move leaves board unchanged");
                return Ok(None);
            }
        }

        // The terminal lane displays by completion time; its keys only need to
        // stay ordered among themselves, so the moved task is appended.
        let index = if lane.is_terminal() {
            siblings.sort_by(|a, b| a.key().cmp(&b.key()).then_with(|| a.id.cmp(&b.id)));
            siblings.len()
        } else {
            index
        };

        let allocation = self.inner.allocator.allocate(&siblings, index, SortKey::now())?;
        let mut batch = vec![(
            id.clone(),
            LanePosition::for_move(&task, lane, allocation.key(), Utc::now()),
        )];
        for (sibling_id, key) in allocation.reassigned() {
            if let Some(sibling) = siblings.iter().find(|t| &t.id == sibling_id) {
                batch.push((
                    sibling_id.clone(),
                    LanePosition {
                        status: lane,
                        sort_order: *key,
                        done_at: sibling.done_at,
                    },
                ));
            }
        }

        debug!(
            %id,
            %lane,
            index,
            key = %allocation.key(),
            rebalanced = allocation.reassigned().len(),
            "moving task"
        );
        self.apply_positions(MutationKind::Reorder, id.clone(), batch)
            .map(Some)
    }

    /// Carry out the result of a drag. Cancelled and unchanged drops are
    /// no-ops that never reach the remote.
    pub fn apply_drop(&self, outcome: &DropOutcome) -> Result<Option<PendingMutation>> {
        match outcome {
            DropOutcome::Move(request) => {
                self.move_task(&request.task_id, request.lane, request.index)
            }
            DropOutcome::Cancelled | DropOutcome::Unchanged => Ok(None),
        }
    }

    /// Reassign every key in a standard lane so it displays in `order`.
    ///
    /// Returns `None` for empty lanes, for the terminal lane, and when the
    /// lane already has the requested keys.
    pub fn resort_lane(&self, lane: Lane, order: ResortOrder) -> Result<Option<PendingMutation>> {
        if lane.is_terminal() {
            debug!(%lane, "terminal lane is ordered by completion time, not resorted");
            return Ok(None);
        }

        let mut tasks = self.snapshot().lane(lane).to_vec();
        let Some(anchor) = tasks.first().map(Task::key) else {
            return Ok(None);
        };
        match order {
            ResortOrder::Title => tasks.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            }),
            ResortOrder::CreatedAt => {
                tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            }
            ResortOrder::Reverse => tasks.reverse(),
        }

        let batch: Vec<(TaskId, LanePosition)> = self
            .inner
            .allocator
            .spread(&tasks, anchor)
            .into_iter()
            .zip(&tasks)
            .filter(|((_, key), task)| task.sort_order != Some(*key))
            .map(|((id, key), task)| {
                (
                    id,
                    LanePosition {
                        status: lane,
                        sort_order: key,
                        done_at: task.done_at,
                    },
                )
            })
            .collect();

        let Some((first, _)) = batch.first() else {
            return Ok(None);
        };
        debug!(%lane, ?order, changed = batch.len(), "resorting lane");
        let first = first.clone();
        self.apply_positions(MutationKind::Resort, first, batch)
            .map(Some)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Apply positions to the cache in one step and write them remotely
    fn apply_positions(
        &self,
        kind: MutationKind,
        task_id: TaskId,
        batch: Vec<(TaskId, LanePosition)>,
    ) -> Result<PendingMutation> {
        let previous = {
            let mut cache = self.write();
            if let Some((missing, _)) = batch.iter().find(|(id, _)| !cache.contains_key(id)) {
                return Err(BoardError::task_not_found(missing));
            }
            let mut previous = Vec::with_capacity(batch.len());
            for (id, position) in &batch {
                if let Some(task) = cache.get_mut(id) {
                    previous.push(task.clone());
                    task.apply_position(position);
                }
            }
            previous
        };
        trace!("optimistic positions: {}", Pretty(&batch));

        let gateway = Arc::clone(&self.inner.gateway);
        Ok(self.dispatch(kind, task_id, previous, async move {
            match batch.as_slice() {
                [(id, position)] => gateway.reorder(id, position).await,
                _ => gateway.reorder_many(&batch).await,
            }
        }))
    }

    /// Run the remote write in the background and reconcile with its result
    fn dispatch<F>(
        &self,
        kind: MutationKind,
        task_id: TaskId,
        previous: Vec<Task>,
        call: F,
    ) -> PendingMutation
    where
        F: Future<Output = GatewayResult<()>> + Send + 'static,
    {
        let store = self.clone();
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let id = task_id.clone();
        let handle = tokio::spawn(async move {
            match call.await {
                Ok(()) => store.confirm(kind, id, epoch).await,
                Err(error) => store.roll_back(kind, id, previous, error).await,
            }
        });
        PendingMutation::new(kind, task_id, handle)
    }

    async fn confirm(&self, kind: MutationKind, id: TaskId, epoch: u64) -> MutationOutcome {
        debug!(%kind, %id, "remote write confirmed");
        // A reload that overlapped this write may predate it
        if self.inner.resync_on_confirm && self.reloaded_since(epoch) {
            debug!(%kind, %id, "cache reloaded mid-flight, resyncing");
            if let Err(error) = self.resync().await {
                self.resync_failed(&error);
            }
        }
        self.emit(StoreEvent::MutationConfirmed { kind, task_id: id });
        MutationOutcome::Confirmed
    }

    async fn roll_back(
        &self,
        kind: MutationKind,
        id: TaskId,
        previous: Vec<Task>,
        error: GatewayError,
    ) -> MutationOutcome {
        warn!(%kind, %id, %error, "remote write failed, discarding optimistic change");
        {
            let mut cache = self.write();
            for task in previous {
                cache.insert(task.id.clone(), task);
            }
        }

        let resynced = match self.resync().await {
            Ok(_) => true,
            Err(resync_error) => {
                self.resync_failed(&resync_error);
                false
            }
        };

        self.emit(StoreEvent::MutationFailed {
            kind,
            task_id: id,
            message: error.to_string(),
        });
        MutationOutcome::RolledBack { error, resynced }
    }

    fn resync_failed(&self, error: &GatewayError) {
        warn!(%error, "canonical reload failed");
        self.emit(StoreEvent::ResyncFailed {
            message: error.to_string(),
        });
    }

    fn emit(&self, event: StoreEvent) {
        trace!(?event, "store event");
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<TaskId, Task>> {
        self.inner.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<TaskId, Task>> {
        self.inner.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}
