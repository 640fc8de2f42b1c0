//! Core data types for the storage layer.
//!
//! - [`Record`]: One row of the power usage time series
//! - [`RowKey`]: Exact physical identity of a row within one tier
//! - [`StoredRecord`]: A record together with its key, as returned by ordered scans
//! - [`Tier`]: Which store (edge or cloud) a row lives in
//! - [`Aggregate`]: Aggregate functions evaluated over `Value_kWh`

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A power usage reading stored in the time-series table.
///
/// Records are immutable once ingested. `start_date` is the sort and
/// migration key and is not required to be unique.
///
/// # Example
///
/// ```
/// use edgetier::Record;
///
/// let record = Record::new("2016-01-01 00:00:00", 1.25, 4, "");
/// assert_eq!(record.day_of_week, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Reading timestamp as text (e.g. "2016-01-01 00:15:00").
    pub start_date: String,
    /// Energy consumed in the interval.
    pub value_kwh: f64,
    /// Day of week, 0 (Monday) through 6 (Sunday).
    pub day_of_week: u8,
    /// Free-form annotation.
    pub notes: String,
}

impl Record {
    pub fn new(
        start_date: impl Into<String>,
        value_kwh: f64,
        day_of_week: u8,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            start_date: start_date.into(),
            value_kwh,
            day_of_week,
            notes: notes.into(),
        }
    }
}

/// Identity of one physical row inside a single tier.
///
/// `rowid` is the SQLite row identifier and only has meaning within the tier
/// it was read from. Pairing it with `start_date` makes deletes exact even
/// when several rows share a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub start_date: String,
    pub rowid: i64,
}

/// A record as read from a tier, with the key needed to delete it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: RowKey,
    pub record: Record,
}

/// Storage tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tier {
    /// Size-bounded store holding the most recent rows.
    Edge,
    /// Unbounded store holding everything evicted from the edge.
    Cloud,
}

/// Aggregate function over `Value_kWh`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Aggregate {
    /// Arithmetic mean.
    #[default]
    #[strum(serialize = "mean", serialize = "avg")]
    Mean,
    Sum,
    Min,
    Max,
    Count,
}

impl Aggregate {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            Self::Mean => "AVG(Value_kWh)",
            Self::Sum => "SUM(Value_kWh)",
            Self::Min => "MIN(Value_kWh)",
            Self::Max => "MAX(Value_kWh)",
            Self::Count => "CAST(COUNT(Value_kWh) AS REAL)",
        }
    }
}

/// Sub-range selector for ordered scans.
///
/// `offset` without `limit` scans to the end of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanWindow {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ScanWindow {
    /// Every row, oldest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// The `n` oldest rows.
    pub fn oldest(n: u64) -> Self {
        Self {
            limit: Some(n),
            offset: None,
        }
    }

    /// Everything after skipping the `n` oldest rows.
    pub fn skip(n: u64) -> Self {
        Self {
            limit: None,
            offset: Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tier_from_str_case_insensitive() {
        assert_eq!(Tier::from_str("edge").unwrap(), Tier::Edge);
        assert_eq!(Tier::from_str("CLOUD").unwrap(), Tier::Cloud);
        assert!(Tier::from_str("fog").is_err());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Edge.to_string(), "edge");
        assert_eq!(Tier::Cloud.as_ref(), "cloud");
    }

    #[test]
    fn test_aggregate_from_str() {
        assert_eq!(Aggregate::from_str("mean").unwrap(), Aggregate::Mean);
        assert_eq!(Aggregate::from_str("AVG").unwrap(), Aggregate::Mean);
        assert_eq!(Aggregate::from_str("Max").unwrap(), Aggregate::Max);
        assert!(Aggregate::from_str("median").is_err());
    }

    #[test]
    fn test_aggregate_default_is_mean() {
        assert_eq!(Aggregate::default(), Aggregate::Mean);
        assert_eq!(Aggregate::Mean.as_sql(), "AVG(Value_kWh)");
    }

    #[test]
    fn test_row_key_orders_by_date_then_rowid() {
        let a = RowKey {
            start_date: "2016-01-01".to_string(),
            rowid: 9,
        };
        let b = RowKey {
            start_date: "2016-01-02".to_string(),
            rowid: 1,
        };
        let c = RowKey {
            start_date: "2016-01-02".to_string(),
            rowid: 2,
        };
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_scan_window_constructors() {
        assert_eq!(ScanWindow::all(), ScanWindow::default());
        assert_eq!(ScanWindow::oldest(5).limit, Some(5));
        assert_eq!(ScanWindow::skip(3).offset, Some(3));
        assert_eq!(ScanWindow::skip(3).limit, None);
    }
}
