use thiserror::Error;

/// Errors that can occur within the distribution queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No queue item with the given ID exists in the store.
    #[error("Queue item not found: {id}")]
    ItemNotFound { id: String },

    /// The submitted post cannot be queued.
    #[error("Invalid queue item: {0}")]
    InvalidItem(String),

    /// The item is not in the status the operation requires.
    #[error("Queue item {id} is {status}, cannot {action}")]
    InvalidTransition {
        id: String,
        status: String,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, QueueError>;
