//! Benchmark harness.
//!
//! Drives the public tiering operations the way an external benchmark would:
//! ingest synthetic readings into edge, migrate, then time an edge-resolved
//! query, a cloud-fallback query and an aggregate comparison. All timing
//! happens here, around the calls.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;
use thiserror::Error;

use crate::storage::{Aggregate, QuerySpec, Record, RowStore, StorageError, Tier};
use crate::tiering::{
    AggregateComparison, MigrationReport, PartitionManager, TierError, compare_aggregate, resolve,
};

/// Minutes between consecutive synthetic readings.
pub const SAMPLE_INTERVAL_MINUTES: i64 = 15;

/// Readings per simulated day (one every 15 minutes).
const SAMPLES_PER_DAY: u64 = 96;

/// Default rows inserted per ingest transaction.
pub const DEFAULT_INGEST_BATCH: usize = 1_000;

/// Errors raised while running the benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Tier(#[from] TierError),

    #[error("synthetic series cannot supply {requested} more readings")]
    SeriesExhausted { requested: u64 },
}

/// Timestamp of sample `i` in the synthetic series, `None` past chrono's range.
fn sample_time(i: u64) -> Option<NaiveDateTime> {
    let series_start = NaiveDate::from_ymd_opt(2016, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let minutes = i64::try_from(i).ok()?.checked_mul(SAMPLE_INTERVAL_MINUTES)?;
    series_start.checked_add_signed(TimeDelta::try_minutes(minutes)?)
}

/// `count` readings at 15 minute spacing starting 2016-01-01, skipping the
/// first `offset` samples of the series.
///
/// Values follow a daily load curve so aggregates are non-trivial. The
/// series stops early where timestamps leave chrono's range.
pub fn synthetic_readings(offset: u64, count: u64) -> Vec<Record> {
    (offset..offset.saturating_add(count))
        .map_while(|i| {
            let ts = sample_time(i)?;
            let slot = (i % SAMPLES_PER_DAY) as f64;
            let value = 0.25 + 2.0 * slot / SAMPLES_PER_DAY as f64;
            Some(Record::new(
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                value,
                ts.weekday().num_days_from_monday() as u8,
                "",
            ))
        })
        .collect()
}

/// A timed query resolution.
#[derive(Debug, Clone, Serialize)]
pub struct QueryTiming {
    pub resolved_tier: Tier,
    pub row_count: usize,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

/// Wall-clock timings for one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub ingested_rows: u64,
    #[serde(with = "humantime_serde")]
    pub ingest: Duration,
    pub migration: MigrationReport,
    #[serde(with = "humantime_serde")]
    pub migrate: Duration,
    pub recent_query: QueryTiming,
    pub historic_query: QueryTiming,
    pub comparison: AggregateComparison,
    #[serde(with = "humantime_serde")]
    pub compare: Duration,
}

async fn timed<T>(fut: impl Future<Output = T>) -> (T, Duration) {
    let start = Instant::now();
    let out = fut.await;
    (out, start.elapsed())
}

/// Query for every reading on the calendar day of `record`.
fn same_day(record: &Record) -> QuerySpec {
    let day = record.start_date.get(..10).unwrap_or(&record.start_date);
    QuerySpec::between(format!("{day} 00:00:00"), format!("{day} 23:59:59"))
}

async fn time_query(
    edge: &dyn RowStore,
    cloud: &dyn RowStore,
    spec: &QuerySpec,
) -> Result<QueryTiming, TierError> {
    let (outcome, elapsed) = timed(resolve(edge, cloud, spec)).await;
    let outcome = outcome?;
    tracing::info!(tier = %outcome.resolved_tier, rows = outcome.row_count, elapsed = ?elapsed, "Query finished");
    Ok(QueryTiming {
        resolved_tier: outcome.resolved_tier,
        row_count: outcome.row_count,
        elapsed,
    })
}

/// Run one benchmark pass.
///
/// New readings continue the synthetic series after whatever both tiers
/// already hold, so repeated runs keep timestamps increasing.
pub async fn run_bench(
    edge: &dyn RowStore,
    cloud: &dyn RowStore,
    manager: &PartitionManager,
    rows: u64,
    batch_size: usize,
) -> Result<BenchReport, BenchError> {
    let existing = edge.count().await? + cloud.count().await?;
    let fits = match existing.checked_add(rows) {
        Some(0) => true,
        Some(end) => sample_time(end - 1).is_some(),
        None => false,
    };
    if !fits {
        return Err(BenchError::SeriesExhausted { requested: rows });
    }
    let records = synthetic_readings(existing, rows);

    let (ingested, ingest) = timed(async {
        let mut ingested = 0;
        for batch in records.chunks(batch_size.max(1)) {
            ingested += edge.bulk_insert(batch).await?;
        }
        Ok::<_, StorageError>(ingested)
    })
    .await;
    let ingested_rows = ingested?;
    tracing::info!(rows = ingested_rows, elapsed = ?ingest, "Ingest finished");

    let (migration, migrate) = timed(manager.migrate(edge, cloud)).await;
    let migration = migration?;
    tracing::info!(migrated = migration.migrated, elapsed = ?migrate, "Migration finished");

    let probe = |record: Option<&Record>| record.map_or_else(|| QuerySpec::day_of_week(0), same_day);
    let recent_query = time_query(edge, cloud, &probe(records.last())).await?;
    let historic_query = time_query(edge, cloud, &probe(records.first())).await?;

    let (comparison, compare) = timed(compare_aggregate(Aggregate::Mean, edge, cloud)).await;
    let comparison = comparison?;

    Ok(BenchReport {
        ingested_rows,
        ingest,
        migration,
        migrate,
        recent_query,
        historic_query,
        comparison,
        compare,
    })
}
