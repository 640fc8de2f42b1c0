//! Tiering error types.

use thiserror::Error;

use crate::storage::{StorageError, Tier};

/// Errors surfaced by migration, resolution and aggregate comparison.
///
/// Nothing is retried internally. An empty result is never an error.
#[derive(Debug, Error)]
pub enum TierError {
    /// Migration aborted with edge unchanged and no copy left in cloud.
    /// Safe to retry.
    #[error("migration failed: {cause}")]
    Migration {
        #[source]
        cause: StorageError,
    },

    /// Migration aborted after the cloud commit and the cloud copy could not
    /// be removed. `rows` records now exist in both tiers.
    #[error("migration failed: {cause}; removing {rows} copied rows from cloud also failed: {rollback}")]
    Stranded {
        rows: u64,
        #[source]
        cause: StorageError,
        rollback: StorageError,
    },

    /// A tier could not execute the query. No fallback to the other tier.
    #[error("query failed on {tier} tier: {cause}")]
    QueryExecution {
        tier: Tier,
        #[source]
        cause: StorageError,
    },
}

impl TierError {
    pub(crate) fn migration(cause: StorageError) -> Self {
        Self::Migration { cause }
    }

    pub(crate) fn query(tier: Tier) -> impl FnOnce(StorageError) -> Self {
        move |cause| Self::QueryExecution { tier, cause }
    }
}
