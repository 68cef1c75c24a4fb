//! Reads the live constraint catalog of a database.

use geno_core::{ConstraintRow, Constraints};
use neo4rs::{query, Row};

use crate::client::{GraphClient, GraphError};

/// Columns consumed by catalog classification.
const LIST_COLUMNS: [&str; 2] = ["labelsOrTypes", "properties"];
const STRING_COLUMNS: [&str; 2] = ["entityType", "type"];

impl GraphClient {
    /// Raw `SHOW CONSTRAINTS` rows for `database`.
    ///
    /// Columns that are absent or of an unexpected shape are left out of the
    /// row, so classification reports the row as malformed.
    pub async fn fetch_constraint_rows(
        &self,
        database: &str,
    ) -> Result<Vec<ConstraintRow>, GraphError> {
        let q = query("SHOW CONSTRAINTS YIELD labelsOrTypes, entityType, properties, type");
        let rows = self.query_rows_on(database, q).await?;
        tracing::debug!(database, rows = rows.len(), "Fetched constraint rows");
        Ok(rows.iter().map(to_constraint_row).collect())
    }

    /// Classified constraint catalog for `database`.
    pub async fn fetch_constraints(&self, database: &str) -> Result<Constraints, GraphError> {
        let rows = self.fetch_constraint_rows(database).await?;
        let catalog = Constraints::from_rows(&rows)?;
        tracing::info!(database, constraints = catalog.len(), "Loaded live constraint catalog");
        Ok(catalog)
    }
}

fn to_constraint_row(row: &Row) -> ConstraintRow {
    let mut out = ConstraintRow::new();
    for column in LIST_COLUMNS {
        if let Ok(values) = row.get::<Vec<String>>(column) {
            out.insert(column, values);
        }
    }
    for column in STRING_COLUMNS {
        if let Ok(value) = row.get::<String>(column) {
            out.insert(column, value);
        }
    }
    out
}
