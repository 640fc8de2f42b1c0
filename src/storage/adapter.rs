//! Row store adapter over a single tier.
//!
//! [`RowStore`] is the seam between the tiering logic and storage. Every bulk
//! mutation is one SQLite transaction, so concurrent scans see either all of a
//! batch or none of it.

use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::storage::StorageError;
use crate::storage::db::{PoolSettings, SqlitePool};
use crate::storage::query::QuerySpec;
use crate::storage::schema::{TABLE_NAME, ensure_schema};
use crate::storage::types::{Aggregate, Record, RowKey, ScanWindow, StoredRecord, Tier};

/// Rows per multi-row INSERT statement (4 bind parameters each).
const INSERT_CHUNK_ROWS: usize = 200;

/// Operations the tiering layer needs from one tier.
#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    /// Which tier this store backs.
    fn tier(&self) -> Tier;

    /// Where the data lives (the connection URL for SQLite).
    ///
    /// Two handles with the same location share one migration lock.
    fn location(&self) -> &str;

    /// Number of rows currently committed.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Rows ordered by `(start_date, rowid)` ascending, restricted to `window`.
    async fn scan_ordered(&self, window: ScanWindow) -> Result<Vec<StoredRecord>, StorageError>;

    /// The oldest rows beyond the newest `retain`, in scan order.
    ///
    /// Count and rows come from one read, so a concurrent delete can never
    /// make this return rows that belong to the newest `retain`.
    async fn scan_excess(&self, retain: u64) -> Result<Vec<StoredRecord>, StorageError>;

    /// Insert all records in one transaction and return the new rows' keys.
    ///
    /// On failure nothing is committed and [`StorageError::PartialFailure`]
    /// names the records that were not written.
    async fn insert_returning_keys(
        &self,
        records: &[Record],
    ) -> Result<Vec<RowKey>, StorageError>;

    /// Insert all records in one transaction, returning how many were written.
    async fn bulk_insert(&self, records: &[Record]) -> Result<u64, StorageError> {
        Ok(self.insert_returning_keys(records).await?.len() as u64)
    }

    /// Delete the rows identified by `keys` in one transaction.
    ///
    /// Keys that match nothing are skipped. Returns the number of rows removed.
    async fn delete_by_keys(&self, keys: &[RowKey]) -> Result<u64, StorageError>;

    /// Delete every row identified by `keys`, or none of them.
    ///
    /// If any key matches nothing the transaction rolls back and
    /// [`StorageError::MissingKeys`] is returned.
    async fn delete_exact(&self, keys: &[RowKey]) -> Result<u64, StorageError>;

    /// Execute an opaque read query.
    async fn query(&self, spec: &QuerySpec) -> Result<Vec<Record>, StorageError>;

    /// Evaluate `aggregate` over the whole table. `None` if undefined.
    async fn aggregate(&self, aggregate: Aggregate) -> Result<Option<f64>, StorageError>;
}

/// SQLite-backed [`RowStore`].
#[derive(Clone)]
pub struct SqliteRowStore {
    tier: Tier,
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteRowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRowStore")
            .field("tier", &self.tier)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SqliteRowStore {
    /// Connect to `url` and make sure the time-series table exists.
    pub async fn open(tier: Tier, url: &str, settings: &PoolSettings) -> Result<Self, StorageError> {
        let pool = SqlitePool::connect(url, settings).await?;
        ensure_schema(&pool).await?;
        tracing::debug!(%tier, url, "Row store opened");
        Ok(Self {
            tier,
            url: url.to_string(),
            pool,
        })
    }

    /// Underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn delete_keys(&self, keys: &[RowKey], exact: bool) -> Result<u64, StorageError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM {TABLE_NAME} WHERE rowid = ?1 AND StartDate = ?2");
        let mut tx = self.pool.inner().begin().await?;
        let mut deleted = 0;

        for key in keys {
            let result = sqlx::query(&sql)
                .bind(key.rowid)
                .bind(key.start_date.as_str())
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }

        if exact && deleted != keys.len() as u64 {
            tx.rollback().await?;
            return Err(StorageError::MissingKeys {
                requested: keys.len(),
                matched: deleted,
            });
        }

        tx.commit().await?;

        tracing::debug!(tier = %self.tier, count = deleted, exact, "Delete by keys committed");
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl RowStore for SqliteRowStore {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn location(&self) -> &str {
        &self.url
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"))
            .fetch_one(self.pool.inner())
            .await?;
        u64::try_from(count).map_err(|_| StorageError::InvalidData(format!("row count {count}")))
    }

    async fn scan_ordered(&self, window: ScanWindow) -> Result<Vec<StoredRecord>, StorageError> {
        // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
        let limit = window.limit.map_or(-1, clamp_i64);
        let offset = window.offset.map_or(0, clamp_i64);

        let rows = sqlx::query(&format!(
            "SELECT rowid AS rowid, StartDate, Value_kWh, day_of_week, notes
             FROM {TABLE_NAME}
             ORDER BY StartDate ASC, rowid ASC
             LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.inner())
        .await?;

        rows.iter().map(stored_from_row).collect()
    }

    async fn scan_excess(&self, retain: u64) -> Result<Vec<StoredRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT rowid AS rowid, StartDate, Value_kWh, day_of_week, notes
             FROM {TABLE_NAME}
             ORDER BY StartDate ASC, rowid ASC
             LIMIT max((SELECT COUNT(*) FROM {TABLE_NAME}) - ?1, 0)"
        ))
        .bind(clamp_i64(retain))
        .fetch_all(self.pool.inner())
        .await?;

        rows.iter().map(stored_from_row).collect()
    }

    async fn insert_returning_keys(
        &self,
        records: &[Record],
    ) -> Result<Vec<RowKey>, StorageError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let partial = |source: sqlx::Error| StorageError::PartialFailure {
            attempted: records.len(),
            committed: 0,
            failed: records.iter().map(|r| r.start_date.clone()).collect(),
            source,
        };

        let mut tx = self.pool.inner().begin().await?;
        let mut keys = Vec::with_capacity(records.len());

        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {TABLE_NAME} (StartDate, Value_kWh, day_of_week, notes) "
            ));
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.start_date.clone())
                    .push_bind(record.value_kwh)
                    .push_bind(i64::from(record.day_of_week))
                    .push_bind(record.notes.clone());
            });
            builder.push(" RETURNING rowid, StartDate");

            match builder
                .build_query_as::<(i64, String)>()
                .fetch_all(&mut *tx)
                .await
            {
                Ok(rows) => keys.extend(
                    rows.into_iter()
                        .map(|(rowid, start_date)| RowKey { start_date, rowid }),
                ),
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::warn!(tier = %self.tier, error = %rollback, "Rollback failed");
                    }
                    return Err(partial(e));
                }
            }
        }

        tx.commit().await.map_err(partial)?;

        tracing::debug!(tier = %self.tier, count = keys.len(), "Bulk insert committed");
        Ok(keys)
    }

    async fn delete_by_keys(&self, keys: &[RowKey]) -> Result<u64, StorageError> {
        self.delete_keys(keys, false).await
    }

    async fn delete_exact(&self, keys: &[RowKey]) -> Result<u64, StorageError> {
        self.delete_keys(keys, true).await
    }

    async fn query(&self, spec: &QuerySpec) -> Result<Vec<Record>, StorageError> {
        let rows = spec.to_query().fetch_all(self.pool.inner()).await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn aggregate(&self, aggregate: Aggregate) -> Result<Option<f64>, StorageError> {
        let value: Option<f64> = sqlx::query_scalar(&format!(
            "SELECT {} FROM {TABLE_NAME}",
            aggregate.as_sql()
        ))
        .fetch_one(self.pool.inner())
        .await?;
        Ok(value)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record, StorageError> {
    let day: i64 = row.try_get("day_of_week")?;
    let day_of_week = u8::try_from(day)
        .ok()
        .filter(|d| *d <= 6)
        .ok_or_else(|| StorageError::InvalidData(format!("day_of_week out of range: {day}")))?;

    Ok(Record {
        start_date: row.try_get("StartDate")?,
        value_kwh: row.try_get("Value_kWh")?,
        day_of_week,
        notes: row.try_get("notes")?,
    })
}

fn stored_from_row(row: &SqliteRow) -> Result<StoredRecord, StorageError> {
    let record = record_from_row(row)?;
    Ok(StoredRecord {
        key: RowKey {
            start_date: record.start_date.clone(),
            rowid: row.try_get("rowid")?,
        },
        record,
    })
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
