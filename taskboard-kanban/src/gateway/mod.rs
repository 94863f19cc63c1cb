//! Persistence gateway: the remote document store the board reconciles with.
//!
//! The store only ever talks to the gateway through this trait. Two
//! implementations ship with the crate: [`MemoryGateway`] for tests and
//! embedding, and [`FileGateway`] which keeps one JSON file per task.

mod file;
mod memory;

pub use file::FileGateway;
pub use memory::{GatewayCall, GatewayOp, MemoryGateway};

use crate::error::GatewayError;
use crate::types::{Lane, LanePosition, NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Which records a `list` call returns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Include archived tasks (excluded from the board by default)
    #[serde(default)]
    pub include_archived: bool,
    /// Restrict to these lanes; `None` means all lanes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lanes: Option<Vec<Lane>>,
}

impl TaskFilter {
    /// Every non-archived task
    pub fn board() -> Self {
        Self::default()
    }

    /// Every task, archived included
    pub fn all() -> Self {
        Self {
            include_archived: true,
            lanes: None,
        }
    }

    /// Restrict to the given lanes
    pub fn with_lanes(mut self, lanes: impl IntoIterator<Item = Lane>) -> Self {
        self.lanes = Some(lanes.into_iter().collect());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        (self.include_archived || !task.archived)
            && self
                .lanes
                .as_ref()
                .is_none_or(|lanes| lanes.contains(&task.status))
    }
}

/// The remote system of record
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Full canonical snapshot of the tasks matching `filter`
    async fn list(&self, filter: &TaskFilter) -> GatewayResult<Vec<Task>>;

    /// Create a task, returning the id the remote assigned
    async fn create(&self, input: &NewTask) -> GatewayResult<TaskId>;

    /// Update non-ordering fields
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()>;

    async fn delete(&self, id: &TaskId) -> GatewayResult<()>;

    /// Write status, sort key and completion time in one call
    async fn reorder(&self, id: &TaskId, position: &LanePosition) -> GatewayResult<()>;

    /// Write several positions (lane rebalance or resort). Stops at the first
    /// failure.
    async fn reorder_many(&self, batch: &[(TaskId, LanePosition)]) -> GatewayResult<()> {
        for (id, position) in batch {
            self.reorder(id, position).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_filter_excludes_archived() {
        let mut task = Task::new("T", Lane::Todo);
        assert!(TaskFilter::board().matches(&task));
        task.archived = true;
        assert!(!TaskFilter::board().matches(&task));
        assert!(TaskFilter::all().matches(&task));
    }

    #[test]
    fn test_lane_filter() {
        let task = Task::new("T", Lane::Review);
        assert!(TaskFilter::board()
            .with_lanes([Lane::Review, Lane::Done])
            .matches(&task));
        assert!(!TaskFilter::board().with_lanes([Lane::Todo]).matches(&task));
    }
}
