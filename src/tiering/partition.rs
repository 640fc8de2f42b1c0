//! Edge retention and edge-to-cloud migration.
//!
//! A migration moves the oldest rows beyond the retention threshold:
//! 1. count edge rows `N`; nothing to do when `N <= K`
//! 2. snapshot the oldest rows beyond the newest `K`, with their exact keys
//! 3. insert the snapshot into cloud (one transaction), keeping the new keys
//! 4. only after that commit, delete exactly the snapshot keys from edge
//!
//! If step 4 fails, the rows inserted in step 3 are deleted from cloud again
//! before the error is returned. A failed migration therefore leaves edge as
//! the only copy and can be retried without duplicating rows in cloud.
//!
//! Migrations are serialized per edge/cloud pair within a process. A migration
//! racing from another process snapshots the same rows, but only one exact
//! edge delete can succeed. The loser removes its cloud copy and fails.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::storage::{Record, RowKey, RowStore, StorageError};
use crate::tiering::TierError;

/// Default number of rows the edge tier keeps.
pub const DEFAULT_RETENTION_ROWS: u64 = 12_000;

/// Result of one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Rows moved from edge to cloud.
    pub migrated: u64,
    /// Edge row count after the move.
    pub edge_rows: u64,
    /// Retention threshold the migration enforced.
    pub retention_rows: u64,
}

/// Enforces the edge retention threshold.
///
/// Any number of managers may point at the same edge/cloud pair; their
/// migrations still run one at a time.
#[derive(Debug)]
pub struct PartitionManager {
    retention_rows: u64,
}

impl Default for PartitionManager {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_ROWS)
    }
}

type PairLocks = std::sync::Mutex<HashMap<(String, String), Arc<Mutex<()>>>>;

/// The migration lock shared by every handle to this edge/cloud pair.
fn pair_lock(edge: &dyn RowStore, cloud: &dyn RowStore) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<PairLocks> = OnceLock::new();

    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks
        .entry((edge.location().to_string(), cloud.location().to_string()))
        .or_default()
        .clone()
}

impl PartitionManager {
    pub fn new(retention_rows: u64) -> Self {
        Self { retention_rows }
    }

    pub fn retention_rows(&self) -> u64 {
        self.retention_rows
    }

    /// Move every edge row beyond the newest `retention_rows` to cloud.
    ///
    /// # Errors
    /// Returns [`TierError::Migration`] if any step fails; edge is then
    /// unchanged and cloud holds no copy. Returns [`TierError::Stranded`] only
    /// if the edge delete failed and the cloud copy could not be removed.
    pub async fn migrate(
        &self,
        edge: &dyn RowStore,
        cloud: &dyn RowStore,
    ) -> Result<MigrationReport, TierError> {
        let lock = pair_lock(edge, cloud);
        let _guard = lock.lock().await;
        migrate_locked(edge, cloud, self.retention_rows).await
    }

    /// Migrate on a fixed interval until `shutdown` resolves.
    ///
    /// Failures are logged and the next tick retries from scratch.
    pub async fn run_every(
        &self,
        edge: &dyn RowStore,
        cloud: &dyn RowStore,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.migrate(edge, cloud).await {
                        tracing::warn!(error = %err, "Periodic migration failed");
                    }
                }
            }
        }

        tracing::debug!("Periodic migration stopped");
    }
}

async fn migrate_locked(
    edge: &dyn RowStore,
    cloud: &dyn RowStore,
    retention_rows: u64,
) -> Result<MigrationReport, TierError> {
    let edge_rows = edge.count().await.map_err(TierError::migration)?;
    if edge_rows <= retention_rows {
        tracing::debug!(edge_rows, retention_rows, "Edge within retention, nothing to migrate");
        return Ok(MigrationReport {
            migrated: 0,
            edge_rows,
            retention_rows,
        });
    }

    let snapshot = edge
        .scan_excess(retention_rows)
        .await
        .map_err(TierError::migration)?;
    let (keys, records): (Vec<RowKey>, Vec<Record>) = snapshot
        .into_iter()
        .map(|stored| (stored.key, stored.record))
        .unzip();
    let batch = records.len() as u64;

    tracing::debug!(
        batch,
        first = records.first().map(|r| r.start_date.as_str()),
        last = records.last().map(|r| r.start_date.as_str()),
        "Migration snapshot taken"
    );

    let copied = cloud
        .insert_returning_keys(&records)
        .await
        .map_err(TierError::migration)?;
    if copied.len() as u64 != batch {
        let cause = StorageError::Internal(format!(
            "cloud accepted {} of {batch} rows",
            copied.len()
        ));
        return Err(remove_cloud_copy(cloud, &copied, cause).await);
    }

    let deleted = match edge.delete_exact(&keys).await {
        Ok(deleted) => deleted,
        Err(cause) => return Err(remove_cloud_copy(cloud, &copied, cause).await),
    };
    if deleted != batch {
        // Committed on edge, so the cloud copy is now the only one.
        return Err(TierError::migration(StorageError::Internal(format!(
            "edge deleted {deleted} of {batch} migrated rows"
        ))));
    }

    let report = MigrationReport {
        migrated: batch,
        edge_rows: edge_rows.saturating_sub(deleted),
        retention_rows,
    };
    tracing::info!(
        migrated = report.migrated,
        edge_rows = report.edge_rows,
        retention_rows,
        "Migration complete"
    );
    Ok(report)
}

/// Undo step 3 after a failure that left the edge rows in place.
async fn remove_cloud_copy(
    cloud: &dyn RowStore,
    copied: &[RowKey],
    cause: StorageError,
) -> TierError {
    match cloud.delete_exact(copied).await {
        Ok(_) => {
            tracing::warn!(
                rows = copied.len(),
                error = %cause,
                "Migration aborted, cloud copy removed"
            );
            TierError::migration(cause)
        }
        Err(rollback) => {
            tracing::error!(
                rows = copied.len(),
                error = %cause,
                rollback_error = %rollback,
                "Migration aborted, rows left in both tiers"
            );
            TierError::Stranded {
                rows: copied.len() as u64,
                cause,
                rollback,
            }
        }
    }
}
