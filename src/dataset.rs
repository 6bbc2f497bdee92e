use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// SQL type of a column in the reporting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    Int,
    Varchar(u16),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("INT"),
            Self::Varchar(len) => write!(f, "VARCHAR({len})"),
        }
    }
}

/// A declared output column of a collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub primary_key: bool,
    pub sql_type: SqlType,
}

impl Column {
    pub const fn key(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            primary_key: true,
            sql_type,
        }
    }

    pub const fn value(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            primary_key: false,
            sql_type,
        }
    }
}

/// A single cell of a dataset row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(u64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Append-only collection of rows produced by a collector.
///
/// Every row must carry exactly one value per declared column.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, rejecting it if its arity does not match the columns.
    pub fn add_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(MetricsError::RowLength {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows keyed by column name, in declared column order.
    pub fn records(&self) -> Vec<IndexMap<String, Value>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> DataSet {
        DataSet::new(vec!["pipeline".to_string(), "build".to_string(), "linux".to_string()])
    }

    #[test]
    fn test_add_row_accepts_matching_arity() {
        let mut data = dataset();
        data.add_row(vec!["p1".into(), 10u64.into(), Value::Null]).unwrap();

        assert_eq!(data.len(), 1);
        assert!(!data.is_empty());
        assert_eq!(data.rows()[0][1], Value::Number(10));
    }

    #[test]
    fn test_add_row_rejects_wrong_arity() {
        let mut data = dataset();
        let err = data.add_row(vec!["p1".into(), 10u64.into()]).unwrap_err();

        assert!(matches!(
            err,
            MetricsError::RowLength {
                expected: 3,
                actual: 2
            }
        ));
        assert!(data.is_empty());
    }

    #[test]
    fn test_records_preserve_column_order() {
        let mut data = dataset();
        data.add_row(vec!["p1".into(), 7u64.into(), "passed".into()]).unwrap();

        let records = data.records();
        let keys: Vec<_> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["pipeline", "build", "linux"]);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let row = vec![Value::from("p1"), Value::from(3u64), Value::Null];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"["p1",3,null]"#);
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("failed")), Value::Text("failed".to_string()));
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_sql_type_display() {
        assert_eq!(SqlType::Int.to_string(), "INT");
        assert_eq!(SqlType::Varchar(255).to_string(), "VARCHAR(255)");
    }
}
