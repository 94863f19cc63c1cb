//! Lane sequencing: display order of tasks within each lane.

use crate::types::{Lane, SortKey, Task, TaskId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Completion-recency key for the terminal lane: `done_at`, falling back to
/// `sort_order`, then `created_at`.
fn completion_key(task: &Task) -> SortKey {
    task.done_at
        .map(SortKey::from_timestamp)
        .unwrap_or_else(|| task.key())
}

/// Display order of two tasks of `lane`.
///
/// Standard lanes ascend by [`Task::key`]; the terminal lane descends by
/// completion time. Ties fall back to the id so the order is total and stable.
pub fn compare_in_lane(lane: Lane, a: &Task, b: &Task) -> Ordering {
    let primary = if lane.is_terminal() {
        completion_key(b).cmp(&completion_key(a))
    } else {
        a.key().cmp(&b.key())
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Sort tasks of a single lane into display order
pub fn sort_lane(lane: Lane, tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_in_lane(lane, a, b));
}

/// The board as the view renders it: every lane's visible tasks in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    lanes: BTreeMap<Lane, Vec<Task>>,
}

impl BoardSnapshot {
    /// Build a snapshot from unordered tasks; archived tasks are left out
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut lanes: BTreeMap<Lane, Vec<Task>> =
            Lane::ALL.iter().map(|lane| (*lane, Vec::new())).collect();
        for task in tasks.into_iter().filter(|t| !t.archived) {
            lanes.entry(task.status).or_default().push(task.clone());
        }
        for (lane, tasks) in lanes.iter_mut() {
            sort_lane(*lane, tasks);
        }
        Self { lanes }
    }

    /// Tasks of `lane` in display order
    pub fn lane(&self, lane: Lane) -> &[Task] {
        self.lanes.get(&lane).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Lane and display index of a task
    pub fn locate(&self, id: &TaskId) -> Option<(Lane, usize)> {
        self.lanes.iter().find_map(|(lane, tasks)| {
            tasks
                .iter()
                .position(|t| &t.id == id)
                .map(|index| (*lane, index))
        })
    }

    /// Ids of `lane` in display order
    pub fn ids(&self, lane: Lane) -> Vec<TaskId> {
        self.lane(lane).iter().map(|t| t.id.clone()).collect()
    }

    /// Lanes in board order
    pub fn iter(&self) -> impl Iterator<Item = (Lane, &[Task])> {
        self.lanes.iter().map(|(lane, tasks)| (*lane, tasks.as_slice()))
    }

    /// Number of visible tasks on the board
    pub fn len(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every standard lane has strictly ascending keys and the
    /// terminal lane non-increasing completion keys.
    pub fn is_ordered(&self) -> bool {
        self.iter().all(|(lane, tasks)| {
            tasks.windows(2).all(|w| {
                if lane.is_terminal() {
                    completion_key(&w[0]) >= completion_key(&w[1])
                } else {
                    w[0].key() < w[1].key()
                }
            })
        })
    }
}
