mod build_success;

pub use build_success::BuildSuccess;

use crate::dataset::{Column, DataSet};
use crate::error::Result;

/// A metric that produces rows for one reporting table.
#[allow(async_fn_in_trait)]
pub trait Collector {
    /// Table name the rows belong to.
    fn name(&self) -> &'static str;

    /// Declared output schema, in row order.
    fn columns(&self) -> &[Column];

    /// Runs one collection cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the CI backend cannot be queried or a row is
    /// rejected; no partial dataset is returned in that case.
    async fn collect(&self) -> Result<DataSet>;
}

pub fn column_names(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.name.to_string()).collect()
}

/// Renders the SQL statement that creates the reporting table for `columns`.
pub fn create_table_statement(table: &str, columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");

    let keys: Vec<_> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name)
        .collect();

    if keys.is_empty() {
        format!("CREATE TABLE {table} ({definitions});")
    } else {
        format!(
            "CREATE TABLE {table} ({definitions}, PRIMARY KEY({}));",
            keys.join(", ")
        )
    }
}
