//! Core types for the task-board engine

mod ids;
mod lane;
mod sort_key;
mod task;

pub use ids::TaskId;
pub use lane::Lane;
pub use sort_key::SortKey;
pub use task::{LanePosition, NewTask, Task, TaskPatch};
