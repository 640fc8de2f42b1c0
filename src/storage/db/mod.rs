//! Database backend for the tier stores.
//!
//! Each tier is an independent SQLite file behind its own pool. The
//! abstraction is intentionally minimal; row-level operations live in
//! [`crate::storage::RowStore`].
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::connect("sqlite:data/edge.db", &PoolSettings::default()).await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::{
    DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_BUSY_TIMEOUT, DEFAULT_MAX_CONNECTIONS, PoolSettings,
    SqlitePool,
};
