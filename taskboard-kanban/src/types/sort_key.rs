//! Sort keys for ordering tasks within a lane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a task within its lane.
///
/// Keys are integers on the millisecond scale so that a missing key can fall
/// back to the task's creation time. Only the relative order of keys within a
/// lane is meaningful; keys need not be contiguous or globally unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(i64);

impl SortKey {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Key derived from a timestamp (milliseconds since the epoch)
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis())
    }

    /// Key for "now"; new tasks and empty lanes start here so they sort last
    pub fn now() -> Self {
        Self::from_timestamp(Utc::now())
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SortKey {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
