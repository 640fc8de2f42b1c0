//! Opaque read queries.
//!
//! A [`QuerySpec`] is SQL text plus positional parameters. It is treated as
//! already validated: the row stores execute it as-is and only distinguish
//! "rows returned" from "error raised". The selected columns must include
//! `StartDate`, `Value_kWh`, `day_of_week` and `notes`.

use serde::{Deserialize, Serialize};
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;

use crate::storage::schema::TABLE_NAME;

/// Positional query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Integer(i64),
    Real(f64),
    Text(String),
}

/// A read query run identically against each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<QueryParam>,
}

impl QuerySpec {
    /// Wrap SQL text with no parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Rows with `from <= StartDate <= to`, oldest first.
    pub fn between(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::raw(format!(
            "SELECT StartDate, Value_kWh, day_of_week, notes FROM {TABLE_NAME}
             WHERE StartDate >= ?1 AND StartDate <= ?2
             ORDER BY StartDate ASC, rowid ASC"
        ))
        .bind_text(from)
        .bind_text(to)
    }

    /// Rows recorded on the given day of week, oldest first.
    pub fn day_of_week(day: u8) -> Self {
        Self::raw(format!(
            "SELECT StartDate, Value_kWh, day_of_week, notes FROM {TABLE_NAME}
             WHERE day_of_week = ?1
             ORDER BY StartDate ASC, rowid ASC"
        ))
        .bind_integer(i64::from(day))
    }

    pub fn bind_text(mut self, value: impl Into<String>) -> Self {
        self.params.push(QueryParam::Text(value.into()));
        self
    }

    pub fn bind_integer(mut self, value: i64) -> Self {
        self.params.push(QueryParam::Integer(value));
        self
    }

    pub fn bind_real(mut self, value: f64) -> Self {
        self.params.push(QueryParam::Real(value));
        self
    }

    /// Build the sqlx query with every parameter bound in order.
    pub(crate) fn to_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |query, param| match param {
                QueryParam::Integer(v) => query.bind(*v),
                QueryParam::Real(v) => query.bind(*v),
                QueryParam::Text(v) => query.bind(v.as_str()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_binds_two_params() {
        let spec = QuerySpec::between("2016-01-01", "2016-01-31");
        assert!(spec.sql.contains(TABLE_NAME));
        assert_eq!(
            spec.params,
            vec![
                QueryParam::Text("2016-01-01".to_string()),
                QueryParam::Text("2016-01-31".to_string()),
            ]
        );
    }

    #[test]
    fn test_day_of_week_binds_integer() {
        let spec = QuerySpec::day_of_week(6);
        assert_eq!(spec.params, vec![QueryParam::Integer(6)]);
    }

    #[test]
    fn test_raw_has_no_params() {
        let spec = QuerySpec::raw("SELECT * FROM PowerUsage_2016_to_2020").bind_real(0.5);
        assert_eq!(spec.params, vec![QueryParam::Real(0.5)]);
    }

    #[test]
    fn test_deserialize_untagged_params() {
        let spec: QuerySpec =
            serde_json::from_str(r#"{"sql": "SELECT 1", "params": [1, 2.5, "x"]}"#).unwrap();
        assert_eq!(
            spec.params,
            vec![
                QueryParam::Integer(1),
                QueryParam::Real(2.5),
                QueryParam::Text("x".to_string()),
            ]
        );
    }
}
