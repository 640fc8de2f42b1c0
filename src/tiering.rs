//! Tiering Layer
//!
//! Decides which rows live in which tier and answers reads across tiers:
//!
//! - [`PartitionManager`]: Keeps the edge tier within its retention threshold
//! - [`resolve`]: Edge-first query resolution with cloud fallback on empty results
//! - [`compare_aggregate`]: Independent per-tier aggregates for divergence checks
//!
//! All operations take explicit [`RowStore`](crate::storage::RowStore) handles;
//! nothing here holds a connection between calls.

mod comparator;
mod error;
mod partition;
mod resolver;

pub use comparator::{AggregateComparison, compare_aggregate};
pub use error::TierError;
pub use partition::{DEFAULT_RETENTION_ROWS, MigrationReport, PartitionManager};
pub use resolver::{QueryOutcome, resolve};

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::{TempDir, tempdir};

    use crate::bench::synthetic_readings;
    use crate::storage::db::PoolSettings;
    use crate::storage::{Record, SqliteRowStore, Tier};

    /// Fresh edge and cloud stores in a temporary directory.
    pub async fn open_pair() -> (TempDir, SqliteRowStore, SqliteRowStore) {
        let dir = tempdir().unwrap();
        let url = |name: &str| format!("sqlite:{}", dir.path().join(name).display());
        let edge = SqliteRowStore::open(Tier::Edge, &url("edge.db"), &PoolSettings::default())
            .await
            .unwrap();
        let cloud = SqliteRowStore::open(Tier::Cloud, &url("cloud.db"), &PoolSettings::default())
            .await
            .unwrap();
        (dir, edge, cloud)
    }

    /// `n` readings with strictly increasing timestamps.
    pub fn readings(n: u64) -> Vec<Record> {
        synthetic_readings(0, n)
    }
}
