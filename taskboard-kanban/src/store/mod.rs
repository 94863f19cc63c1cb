//! The task store: cache, optimistic mutations and reconciliation

mod events;
mod pending;
mod task_store;

pub use events::{MutationKind, StoreEvent};
pub use pending::{MutationOutcome, PendingMutation};
pub use task_store::{ResortOrder, TaskStore};
