//! Handles for mutations whose remote write is still in flight

use super::events::MutationKind;
use crate::error::GatewayError;
use crate::types::TaskId;
use tokio::task::JoinHandle;

/// How an optimistic mutation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote accepted the write; the cache was left as is
    Confirmed,
    /// The remote rejected the write; the optimistic change was discarded.
    /// `resynced` is false when the canonical reload also failed.
    RolledBack { error: GatewayError, resynced: bool },
    /// The background task was cancelled or panicked
    Aborted { message: String },
}

impl MutationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Self::RolledBack { .. })
    }
}

/// A mutation applied locally whose remote write has not settled.
///
/// Dropping the handle detaches it: reconciliation still runs in the
/// background. Await [`settled`](Self::settled) to observe the outcome.
#[derive(Debug)]
pub struct PendingMutation {
    kind: MutationKind,
    task_id: TaskId,
    handle: JoinHandle<MutationOutcome>,
}

impl PendingMutation {
    pub(crate) fn new(
        kind: MutationKind,
        task_id: TaskId,
        handle: JoinHandle<MutationOutcome>,
    ) -> Self {
        Self {
            kind,
            task_id,
            handle,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn is_settled(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the remote write and any rollback to finish
    pub async fn settled(self) -> MutationOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => MutationOutcome::Aborted {
                message: err.to_string(),
            },
        }
    }
}
