//! Storage Layer
//!
//! Each tier (edge and cloud) is an independent SQLite database holding one
//! time-series table. This module provides the row store adapter the tiering
//! logic runs against:
//!
//! - [`RowStore`]: Ordered scan, bulk insert, delete-by-key, query and aggregate
//! - [`SqliteRowStore`]: Transactional SQLite implementation
//! - [`QuerySpec`]: Opaque read query executed against a tier
//! - [`StorageBuilder`] / [`StorageHandles`]: Opening and closing both tiers

mod adapter;
mod builder;
pub mod db;
mod error;
mod query;
pub mod schema;
mod types;

pub use adapter::{RowStore, SqliteRowStore};
pub use builder::{StorageBuilder, StorageHandles};
pub use error::StorageError;
pub use query::{QueryParam, QuerySpec};
pub use types::{Aggregate, Record, RowKey, ScanWindow, StoredRecord, Tier};
