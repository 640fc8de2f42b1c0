//! edgetier - Two-Tier Time-Series Store
//!
//! Keeps the most recent readings in a size-bounded *edge* SQLite store and
//! moves everything older into an unbounded *cloud* store. Reads go to the
//! edge first and fall back to the cloud only when the edge has no match.
//!
//! # Architecture
//!
//! - **Storage**: Per-tier row store adapter over SQLite ([`RowStore`])
//! - **Tiering**: Retention/migration ([`PartitionManager`]), edge-first
//!   query resolution ([`resolve`]) and per-tier aggregates ([`compare_aggregate`])
//! - **Config**: YAML configuration for both tiers and the retention policy
//! - **Bench**: Timing harness that drives the public operations
//!
//! # Example
//!
//! ```rust,no_run
//! use edgetier::{PartitionManager, QuerySpec, StorageBuilder, resolve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tiers = StorageBuilder::new("sqlite:data/edge.db", "sqlite:data/cloud.db")
//!         .build()
//!         .await?;
//!     let manager = PartitionManager::new(12_000);
//!
//!     manager.migrate(&tiers.edge, &tiers.cloud).await?;
//!     let outcome = resolve(
//!         &tiers.edge,
//!         &tiers.cloud,
//!         &QuerySpec::between("2016-01-01", "2016-01-31"),
//!     )
//!     .await?;
//!     println!("{} rows from {}", outcome.row_count, outcome.resolved_tier);
//!
//!     tiers.close().await;
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod config;
pub mod storage;
pub mod tiering;

pub use storage::{
    Aggregate, QuerySpec, Record, RowKey, RowStore, ScanWindow, SqliteRowStore, StorageBuilder,
    StorageError, StorageHandles, StoredRecord, Tier,
};
pub use tiering::{
    AggregateComparison, MigrationReport, PartitionManager, QueryOutcome, TierError,
    compare_aggregate, resolve,
};
