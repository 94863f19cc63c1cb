//! Task types: Task, NewTask, TaskPatch, LanePosition

use super::ids::TaskId;
use super::lane::Lane;
use super::sort_key::SortKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task/card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// Lane the task currently sits in
    pub status: Lane,

    /// Manual position within the lane. Absent on legacy records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortKey>,

    /// Set when the task enters the terminal lane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    /// Archived tasks are excluded from lane queries
    #[serde(default)]
    pub archived: bool,
}

impl Task {
    /// Create a task in the given lane, positioned last by default
    pub fn new(title: impl Into<String>, status: Lane) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            title: title.into(),
            description: String::new(),
            status,
            sort_order: Some(SortKey::from_timestamp(now)),
            done_at: status.is_terminal().then_some(now),
            created_at: now,
            archived: false,
        }
    }

    /// Materialize a record from a create request and the id the gateway assigned
    pub fn from_new(id: TaskId, input: &NewTask) -> Self {
        Self {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            sort_order: Some(input.sort_order),
            done_at: input.done_at,
            created_at: input.created_at,
            archived: false,
        }
    }

    /// Ordering key within a standard lane: `sort_order`, else creation time
    pub fn key(&self) -> SortKey {
        self.sort_order
            .unwrap_or_else(|| SortKey::from_timestamp(self.created_at))
    }

    /// Current lane, sort key and completion time
    pub fn position(&self) -> LanePosition {
        LanePosition {
            status: self.status,
            sort_order: self.key(),
            done_at: self.done_at,
        }
    }

    /// Apply a lane position in one step
    pub fn apply_position(&mut self, position: &LanePosition) {
        self.status = position.status;
        self.sort_order = Some(position.sort_order);
        self.done_at = position.done_at;
    }

    /// Apply the fields present in a patch
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the sort key
    pub fn with_sort_order(mut self, key: impl Into<SortKey>) -> Self {
        self.sort_order = Some(key.into());
        self
    }

    /// Clear the sort key, as on records created before keys existed
    pub fn without_sort_order(mut self) -> Self {
        self.sort_order = None;
        self
    }

    /// Set the creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the completion time
    pub fn with_done_at(mut self, done_at: DateTime<Utc>) -> Self {
        self.done_at = Some(done_at);
        self
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }
}

/// Input for creating a task. The gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Lane,
    pub sort_order: SortKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// New task in the first lane, stamped "now" so it sorts last
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: String::new(),
            status: Lane::default(),
            sort_order: SortKey::from_timestamp(now),
            done_at: None,
            created_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set an explicit sort key instead of the creation timestamp
    pub fn with_sort_order(mut self, key: impl Into<SortKey>) -> Self {
        self.sort_order = key.into();
        self
    }

    /// Set the lane; tasks created directly in the terminal lane are completed now
    pub fn in_lane(mut self, status: Lane) -> Self {
        self.status = status;
        self.done_at = status.is_terminal().then_some(self.created_at);
        self
    }
}

/// Partial update of the non-ordering fields of a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Archive or unarchive
    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.archived.is_none()
    }
}

/// The order-affecting fields of a task, always written together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePosition {
    pub status: Lane,
    pub sort_order: SortKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
}

impl LanePosition {
    /// Position reached by moving `task` into `status` with `sort_order`.
    ///
    /// Entering the terminal lane stamps `done_at` with `now`; staying in it
    /// keeps the original completion time; leaving it clears the stamp.
    pub fn for_move(task: &Task, status: Lane, sort_order: SortKey, now: DateTime<Utc>) -> Self {
        let done_at = match (task.status.is_terminal(), status.is_terminal()) {
            (false, true) => Some(now),
            (true, true) => task.done_at.or(Some(now)),
            (_, false) => None,
        };
        Self {
            status,
            sort_order,
            done_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_task_creation_sorts_last() {
        let task = Task::new("Test task", Lane::Todo);
        assert_eq!(task.title, "Test task");
        assert_eq!(task.sort_order, Some(SortKey::from_timestamp(task.created_at)));
        assert!(task.done_at.is_none());
    }

    #[test]
    fn test_key_falls_back_to_created_at() {
        let task = Task::new("Legacy", Lane::Todo)
            .without_sort_order()
            .with_created_at(at(42_000));
        assert_eq!(task.key(), SortKey::new(42_000));

        let task = task.with_sort_order(7);
        assert_eq!(task.key(), SortKey::new(7));
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut task = Task::new("Before", Lane::Review).with_description("keep me");
        let key = task.sort_order;
        task.apply_patch(&TaskPatch::new().with_title("After"));
        assert_eq!(task.title, "After");
        assert_eq!(task.description, "keep me");
        assert_eq!(task.status, Lane::Review);
        assert_eq!(task.sort_order, key);
    }

    #[test]
    fn test_move_into_terminal_lane_stamps_done_at() {
        let task = Task::new("T", Lane::Todo);
        let pos = LanePosition::for_move(&task, Lane::Done, SortKey::new(5), at(9_000));
        assert_eq!(pos.done_at, Some(at(9_000)));
        assert_eq!(pos.status, Lane::Done);
    }

    #[test]
    fn test_move_within_terminal_lane_keeps_done_at() {
        let task = Task::new("T", Lane::Done).with_done_at(at(1_000));
        let pos = LanePosition::for_move(&task, Lane::Done, SortKey::new(5), at(9_000));
        assert_eq!(pos.done_at, Some(at(1_000)));
    }

    #[test]
    fn test_move_out_of_terminal_lane_clears_done_at() {
        let task = Task::new("T", Lane::Done).with_done_at(at(1_000));
        let pos = LanePosition::for_move(&task, Lane::Todo, SortKey::new(5), at(9_000));
        assert!(pos.done_at.is_none());
    }

    #[test]
    fn test_task_serialization() {
        let task = Task::new("Test", Lane::InProgress).with_description("Description");
        let json = serde_json::to_string_pretty(&task).unwrap();
        assert!(json.contains("\"in_progress\""));
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }

    #[test]
    fn test_legacy_record_without_sort_order_parses() {
        let json = r#"{
            "id": "legacy",
            "title": "Old",
            "status": "todo",
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.sort_order.is_none());
        assert!(!task.archived);
        assert_eq!(task.key(), SortKey::from_timestamp(task.created_at));
    }
}
