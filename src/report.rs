use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{DataSet, Value};

/// Result of one collection cycle, ready for export.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsReport {
    pub collector: String,
    pub collected_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, Value>>,
}

impl MetricsReport {
    pub fn new(collector: &str, data: &DataSet) -> Self {
        Self {
            collector: collector.to_string(),
            collected_at: Utc::now(),
            columns: data.columns().to_vec(),
            rows: data.records(),
        }
    }

    /// Values of one column across all rows, skipping nulls.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.get(column))
            .filter(|value| !value.is_null())
    }
}
