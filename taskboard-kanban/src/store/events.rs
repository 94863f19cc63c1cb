//! Notifications published by the task store

use crate::types::TaskId;
use serde::Serialize;
use std::fmt;

/// Kind of store mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Reorder,
    Resort,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Create => "create task",
            Self::Update => "update task",
            Self::Delete => "delete task",
            Self::Reorder => "reorder task",
            Self::Resort => "resort lane",
        };
        f.write_str(op)
    }
}

/// Something the board view should react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The cache was replaced with a canonical read
    Synced { count: usize },
    /// The remote accepted a mutation
    MutationConfirmed { kind: MutationKind, task_id: TaskId },
    /// The remote rejected a mutation; the optimistic change was discarded.
    /// This is the user-visible error notification.
    MutationFailed {
        kind: MutationKind,
        task_id: TaskId,
        message: String,
    },
    /// The remote rejected a new task; nothing was added to the cache
    CreateFailed { title: String, message: String },
    /// A canonical reload failed; the cache holds the locally reverted state
    ResyncFailed { message: String },
}

impl StoreEvent {
    /// Whether this event should be surfaced to the user as an error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::MutationFailed { .. } | Self::CreateFailed { .. } | Self::ResyncFailed { .. }
        )
    }
}
