//! Sort-key allocation.
//!
//! The allocator is the only place new sort keys are computed. Given a lane in
//! display order (with the moved task already removed) and an insertion index,
//! it returns a key that lands the task at that index without rewriting its
//! siblings. When neighbouring keys have converged so that no integer fits
//! between them, it falls back to respacing the whole lane.

use crate::error::{BoardError, Result};
use crate::types::{SortKey, Task, TaskId};

/// Default distance between keys at lane boundaries and after a rebalance
pub const DEFAULT_GAP: i64 = 1000;

/// Outcome of an allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// The moved task takes this key; no sibling changes
    Key(SortKey),
    /// No key fits; the lane was respaced. `reassigned` lists only the
    /// siblings whose key changed.
    Rebalanced {
        key: SortKey,
        reassigned: Vec<(TaskId, SortKey)>,
    },
}

impl Allocation {
    /// Key for the moved task
    pub fn key(&self) -> SortKey {
        match self {
            Self::Key(key) => *key,
            Self::Rebalanced { key, .. } => *key,
        }
    }

    /// Siblings that need a new key alongside the moved task
    pub fn reassigned(&self) -> &[(TaskId, SortKey)] {
        match self {
            Self::Key(_) => &[],
            Self::Rebalanced { reassigned, .. } => reassigned,
        }
    }

    pub fn is_rebalance(&self) -> bool {
        matches!(self, Self::Rebalanced { .. })
    }
}

/// Computes sort keys for insertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKeyAllocator {
    gap: i64,
}

impl Default for SortKeyAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_GAP)
    }
}

impl SortKeyAllocator {
    /// Create an allocator with the given boundary gap (clamped to at least 1)
    pub fn new(gap: i64) -> Self {
        Self { gap: gap.max(1) }
    }

    pub fn gap(&self) -> i64 {
        self.gap
    }

    /// Key for inserting a task at `index` of `lane`.
    ///
    /// `lane` is the target lane in display order, without the moved task.
    /// `baseline` is used when the lane is empty (callers pass "now").
    pub fn allocate(&self, lane: &[Task], index: usize, baseline: SortKey) -> Result<Allocation> {
        let keys: Vec<SortKey> = lane.iter().map(Task::key).collect();
        match self.allocate_key(&keys, index, baseline)? {
            Some(key) => Ok(Allocation::Key(key)),
            None => {
                tracing::debug!(
                    lane_len = lane.len(),
                    index,
                    "sort keys converged, rebalancing lane"
                );
                Ok(self.rebalance(lane, index, baseline))
            }
        }
    }

    /// Uniformly spaced keys for `tasks` in the given order, starting at `anchor`.
    pub fn spread<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
        anchor: SortKey,
    ) -> Vec<(TaskId, SortKey)> {
        let ids: Vec<&TaskId> = tasks.into_iter().map(|t| &t.id).collect();
        let keys = self.spaced_keys(ids.len(), anchor);
        ids.into_iter().cloned().zip(keys).collect()
    }

    /// Returns `None` when no key fits and the lane must be rebalanced.
    fn allocate_key(
        &self,
        keys: &[SortKey],
        index: usize,
        baseline: SortKey,
    ) -> Result<Option<SortKey>> {
        if index > keys.len() {
            tracing::error!(index, len = keys.len(), "insertion index out of range");
            debug_assert!(
                index <= keys.len(),
                "insertion index {index} out of range for lane of {} tasks",
                keys.len()
            );
            return Err(BoardError::InsertionIndexOutOfRange {
                index,
                len: keys.len(),
            });
        }

        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return Ok(Some(baseline));
        };

        if index == 0 {
            return Ok(first.value().checked_sub(self.gap).map(SortKey::new));
        }
        if index == keys.len() {
            return Ok(last.value().checked_add(self.gap).map(SortKey::new));
        }

        let before = keys[index - 1].value();
        let after = keys[index].value();
        let mid = (before as i128 + after as i128).div_euclid(2) as i64;
        if before < mid && mid < after {
            Ok(Some(SortKey::new(mid)))
        } else {
            Ok(None)
        }
    }

    fn rebalance(&self, lane: &[Task], index: usize, baseline: SortKey) -> Allocation {
        let anchor = lane.first().map(Task::key).unwrap_or(baseline);
        let keys = self.spaced_keys(lane.len() + 1, anchor);

        let moved_key = keys[index];
        let mut reassigned = Vec::new();
        for (slot, key) in keys.into_iter().enumerate() {
            let sibling = match slot.cmp(&index) {
                std::cmp::Ordering::Less => &lane[slot],
                std::cmp::Ordering::Equal => continue,
                std::cmp::Ordering::Greater => &lane[slot - 1],
            };
            if sibling.key() != key {
                reassigned.push((sibling.id.clone(), key));
            }
        }

        Allocation::Rebalanced {
            key: moved_key,
            reassigned,
        }
    }

    /// `count` keys spaced `gap` apart from `anchor`, re-anchored at zero when
    /// the run would overflow.
    fn spaced_keys(&self, count: usize, anchor: SortKey) -> Vec<SortKey> {
        let span = self.gap as i128 * count.saturating_sub(1) as i128;
        let start = if anchor.value() as i128 + span <= i64::MAX as i128 {
            anchor.value() as i128
        } else {
            0
        };
        (0..count)
            .map(|i| SortKey::new((start + self.gap as i128 * i as i128) as i64))
            .collect()
    }
}
