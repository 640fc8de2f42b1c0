//! Storage-specific error types.
//!
//! All row store operations return [`StorageError`] on failure, which can be
//! matched to determine the underlying cause (database, partial bulk write, etc.).

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bulk insert did not apply every record.
    ///
    /// The SQLite adapter rolls the whole batch back, so `committed` is zero
    /// and `failed` lists every record's `start_date`.
    #[error("bulk insert failed: {committed}/{attempted} committed, {} failed: {source}", failed.len())]
    PartialFailure {
        attempted: usize,
        committed: usize,
        failed: Vec<String>,
        #[source]
        source: sqlx::Error,
    },

    /// An exact delete found fewer rows than keys; nothing was deleted.
    #[error("exact delete matched {matched} of {requested} keys, rolled back")]
    MissingKeys { requested: usize, matched: u64 },

    /// Invalid data in database (e.g., out-of-range day_of_week).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error (e.g., directory creation failure).
    #[error("internal error: {0}")]
    Internal(String),
}
