//! Database schema definitions.

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;

/// Name of the time-series table present in every tier.
pub const TABLE_NAME: &str = "PowerUsage_2016_to_2020";

/// SQL statement for creating the power usage table.
///
/// The table has no declared primary key; SQLite's implicit `rowid`
/// identifies physical rows and breaks `StartDate` ties.
pub const POWER_USAGE_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS "PowerUsage_2016_to_2020" (
    "StartDate"   TEXT NOT NULL COLLATE NOCASE,
    "Value_kWh"   REAL NOT NULL,
    "day_of_week" INTEGER NOT NULL,
    "notes"       TEXT NOT NULL COLLATE NOCASE
);
"#;

/// Index backing ordered scans by `StartDate`.
pub const START_DATE_INDEX_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS "idx_power_usage_start_date"
    ON "PowerUsage_2016_to_2020" ("StartDate");
"#;

/// Create the time-series table if it doesn't exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(POWER_USAGE_TABLE_DDL)
        .execute(pool.inner())
        .await?;
    sqlx::query(START_DATE_INDEX_DDL)
        .execute(pool.inner())
        .await?;

    tracing::debug!(table = TABLE_NAME, "Schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::PoolSettings;
    use tempfile::tempdir;

    async fn open(dir: &tempfile::TempDir) -> SqlitePool {
        let url = format!("sqlite:{}", dir.path().join("schema.db").display());
        SqlitePool::connect(&url, &PoolSettings::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let dir = tempdir().unwrap();
        let pool = open(&dir).await;
        ensure_schema(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(TABLE_NAME)
        .fetch_one(pool.inner())
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let pool = open(&dir).await;
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_not_null_columns() {
        let dir = tempdir().unwrap();
        let pool = open(&dir).await;
        ensure_schema(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO PowerUsage_2016_to_2020 (StartDate, Value_kWh, day_of_week, notes)
             VALUES ('2016-01-01', NULL, 1, '')",
        )
        .execute(pool.inner())
        .await;
        assert!(result.is_err());
    }
}
