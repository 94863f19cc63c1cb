//! Error types for the task-board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Failures reported by a [`PersistenceGateway`](crate::gateway::PersistenceGateway).
///
/// Every variant is recoverable from the store's point of view: the optimistic
/// change is discarded and canonical state is reloaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote service could not be reached
    #[error("remote unavailable: {message}")]
    Unavailable { message: String },

    /// The record does not exist remotely
    #[error("remote record not found: {id}")]
    NotFound { id: String },

    /// The caller may not perform this write
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The remote rejected the write as conflicting
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The call did not complete in time
    #[error("remote call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The backing storage failed (file gateway)
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl GatewayError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Task is not in the local cache
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// Lane name did not match any known lane
    #[error("unknown lane: {name}")]
    UnknownLane { name: String },

    /// Insertion index outside `[0, len]`; indicates a caller bug
    #[error("insertion index {index} out of range for lane of {len} tasks")]
    InsertionIndexOutOfRange { index: usize, len: usize },

    /// drag-start while another drag is active
    #[error("drag already in progress for task {id}")]
    DragAlreadyActive { id: String },

    /// The dragged task is not part of the rendered layout
    #[error("task {id} is not rendered on the board")]
    TaskNotRendered { id: String },

    /// Invalid configuration value
    #[error("invalid configuration for {field}: {message}")]
    Config { field: String, message: String },

    /// Remote call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl BoardError {
    /// Create a task-not-found error
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::TaskNotFound { id: id.to_string() }
    }

    /// Create a configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Gateway(GatewayError::Unavailable { .. } | GatewayError::Timeout { .. })
        )
    }
}

impl From<figment::Error> for BoardError {
    fn from(err: figment::Error) -> Self {
        let field = err
            .path
            .last()
            .cloned()
            .unwrap_or_else(|| "config".to_string());
        Self::Config {
            field,
            message: err.to_string(),
        }
    }
}
