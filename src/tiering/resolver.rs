//! Edge-first query resolution.
//!
//! The edge tier answers whenever it returns at least one row, even if the
//! cloud tier also holds matches. Only an empty edge result falls through to
//! cloud. An error from either tier is returned as-is, never retried on the
//! other tier.

use serde::Serialize;

use crate::storage::{QuerySpec, Record, RowStore, Tier};
use crate::tiering::TierError;

/// Rows returned by [`resolve`] and the tier that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub resolved_tier: Tier,
    pub row_count: usize,
    pub rows: Vec<Record>,
}

impl QueryOutcome {
    fn new(resolved_tier: Tier, rows: Vec<Record>) -> Self {
        Self {
            resolved_tier,
            row_count: rows.len(),
            rows,
        }
    }
}

/// Run `spec` against edge, falling back to cloud only on an empty result.
///
/// # Errors
/// Returns [`TierError::QueryExecution`] naming the tier that failed.
pub async fn resolve(
    edge: &dyn RowStore,
    cloud: &dyn RowStore,
    spec: &QuerySpec,
) -> Result<QueryOutcome, TierError> {
    let rows = edge.query(spec).await.map_err(TierError::query(Tier::Edge))?;
    if !rows.is_empty() {
        tracing::debug!(rows = rows.len(), "Query resolved on edge");
        return Ok(QueryOutcome::new(Tier::Edge, rows));
    }

    let rows = cloud
        .query(spec)
        .await
        .map_err(TierError::query(Tier::Cloud))?;
    tracing::debug!(rows = rows.len(), "Query fell back to cloud");
    Ok(QueryOutcome::new(Tier::Cloud, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiering::test_support::open_pair;

    fn at(date: &str, value: f64) -> Record {
        Record::new(date, value, 0, "")
    }

    #[tokio::test]
    async fn test_edge_rows_win_without_consulting_cloud() {
        let (_dir, edge, cloud) = open_pair().await;
        edge.bulk_insert(&[at("2016-03-02 00:00:00", 1.0)])
            .await
            .unwrap();
        cloud
            .bulk_insert(&[at("2016-03-01 00:00:00", 9.0)])
            .await
            .unwrap();

        let outcome = resolve(
            &edge,
            &cloud,
            &QuerySpec::between("2016-03-01", "2016-03-31"),
        )
        .await
        .unwrap();

        assert_eq!(outcome.resolved_tier, Tier::Edge);
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.rows, vec![at("2016-03-02 00:00:00", 1.0)]);
    }

    #[tokio::test]
    async fn test_empty_edge_falls_back_to_cloud() {
        let (_dir, edge, cloud) = open_pair().await;
        edge.bulk_insert(&[at("2017-01-01 00:00:00", 1.0)])
            .await
            .unwrap();
        cloud
            .bulk_insert(&[at("2016-01-01 00:00:00", 2.0), at("2016-01-02 00:00:00", 3.0)])
            .await
            .unwrap();

        let outcome = resolve(
            &edge,
            &cloud,
            &QuerySpec::between("2016-01-01", "2016-12-31"),
        )
        .await
        .unwrap();

        assert_eq!(outcome.resolved_tier, Tier::Cloud);
        assert_eq!(outcome.row_count, 2);
    }

    #[tokio::test]
    async fn test_empty_everywhere_resolves_to_cloud() {
        let (_dir, edge, cloud) = open_pair().await;

        let outcome = resolve(&edge, &cloud, &QuerySpec::day_of_week(3))
            .await
            .unwrap();

        assert_eq!(outcome.resolved_tier, Tier::Cloud);
        assert_eq!(outcome.row_count, 0);
        assert!(outcome.rows.is_empty());
    }

    #[tokio::test]
    async fn test_edge_error_does_not_fall_back() {
        let (_dir, edge, cloud) = open_pair().await;
        cloud
            .bulk_insert(&[at("2016-01-01 00:00:00", 2.0)])
            .await
            .unwrap();

        let err = resolve(&edge, &cloud, &QuerySpec::raw("SELECT * FROM missing"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TierError::QueryExecution {
                tier: Tier::Edge,
                ..
            }
        ));
    }
}
