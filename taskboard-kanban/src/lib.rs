//! Task-board ordering engine
//!
//! Tasks live in four fixed lanes (`todo`, `in_progress`, `review`, `done`)
//! and are positioned inside a lane by an integer sort key. The crate covers
//! the client side of such a board:
//!
//! - **Sort keys** - [`SortKeyAllocator`] picks a key that lands a task at a
//!   given slot, touching only the moved task unless the lane has run out of
//!   room, in which case the whole lane is respaced.
//! - **Drag interaction** - [`DragController`] turns pointer events over a
//!   [`BoardLayout`] into drop targets and move requests, including the
//!   "dropped on itself" suppression.
//! - **Optimistic store** - [`TaskStore`] applies every change locally first,
//!   writes it through a [`PersistenceGateway`], and on failure reverts and
//!   reloads the canonical state.
//! - **Completion tracking** - entering the terminal lane stamps `done_at`,
//!   which orders that lane most-recent-first; leaving it clears the stamp.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskboard_kanban::{FileGateway, Lane, NewTask, TaskStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = FileGateway::new("/path/to/repo/.taskboard");
//! gateway.create_directories().await?;
//!
//! let store = TaskStore::new(Arc::new(gateway));
//! store.load().await?;
//!
//! let id = store.create(NewTask::new("Write release notes")).await?;
//! if let Some(pending) = store.move_task(&id, Lane::Review, 0)? {
//!     pending.settled().await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! repo/
//! └── .taskboard/
//!     ├── config.toml       # Optional settings (also .yaml / .json)
//!     └── tasks/
//!         └── {id}.json     # One record per task
//! ```

pub mod config;
pub mod drag;
mod error;
pub mod gateway;
pub mod logging;
pub mod ordering;
pub mod store;
pub mod types;

pub use config::BoardConfig;
pub use drag::{BoardLayout, DragController, DropOutcome, DropTarget, MoveRequest, Point};
pub use error::{BoardError, GatewayError, Result};
pub use gateway::{FileGateway, MemoryGateway, PersistenceGateway, TaskFilter};
pub use ordering::{BoardSnapshot, SortKeyAllocator};
pub use store::{MutationOutcome, PendingMutation, ResortOrder, StoreEvent, TaskStore};
pub use types::{Lane, LanePosition, NewTask, SortKey, Task, TaskId, TaskPatch};
