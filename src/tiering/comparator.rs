//! Per-tier aggregate comparison.

use serde::Serialize;

use crate::storage::{Aggregate, RowStore, Tier};
use crate::tiering::TierError;

/// One aggregate evaluated independently on each tier.
///
/// Values are reported as computed; nothing is merged or weighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateComparison {
    pub aggregate: Aggregate,
    pub edge_value: Option<f64>,
    pub cloud_value: Option<f64>,
}

impl AggregateComparison {
    /// `edge_value - cloud_value`, if both are defined.
    pub fn divergence(&self) -> Option<f64> {
        Some(self.edge_value? - self.cloud_value?)
    }
}

/// Evaluate `aggregate` over the full contents of both tiers.
pub async fn compare_aggregate(
    aggregate: Aggregate,
    edge: &dyn RowStore,
    cloud: &dyn RowStore,
) -> Result<AggregateComparison, TierError> {
    let (edge_value, cloud_value) =
        tokio::join!(edge.aggregate(aggregate), cloud.aggregate(aggregate));

    let comparison = AggregateComparison {
        aggregate,
        edge_value: edge_value.map_err(TierError::query(Tier::Edge))?,
        cloud_value: cloud_value.map_err(TierError::query(Tier::Cloud))?,
    };
    tracing::debug!(
        %aggregate,
        edge = ?comparison.edge_value,
        cloud = ?comparison.cloud_value,
        "Aggregate compared"
    );
    Ok(comparison)
}
