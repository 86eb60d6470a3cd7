//! SQL over worksheets: find the tables a query references, load them into a
//! transient session and run the query.

use crate::error::{GSheetsError, Result};
use crate::models::Frame;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use datafusion::sql::parser::DFParser;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Table names referenced by a single SQL statement, in first-seen order.
///
/// Names defined by common table expressions are not included. Unquoted
/// identifiers are normalized to lowercase.
pub fn table_references(sql: &str) -> Result<Vec<TableReference>> {
    let mut statements =
        DFParser::parse_sql(sql).map_err(|e| GSheetsError::Query(e.to_string()))?;
    if statements.len() != 1 {
        return Err(GSheetsError::Query(format!(
            "Expected exactly one SQL statement, found {}",
            statements.len()
        )));
    }
    let statement = statements
        .pop_front()
        .ok_or_else(|| GSheetsError::Query("Empty SQL statement".to_string()))?;

    let ctx = SessionContext::new();
    let mut references = Vec::new();
    for reference in ctx.state().resolve_table_references(&statement)? {
        if !references.contains(&reference) {
            references.push(reference);
        }
    }

    Ok(references)
}

/// Run `sql` against the given tables in a fresh in-memory session.
#[instrument(name = "Executing query", skip_all)]
pub async fn execute(sql: &str, tables: Vec<(TableReference, Frame)>) -> Result<Frame> {
    let ctx = SessionContext::new();

    for (reference, frame) in tables {
        debug!(table = %reference, rows = frame.num_rows(), "Registering table");
        let (schema, batches) = frame.into_parts();
        let table = MemTable::try_new(schema, vec![batches])?;
        ctx.register_table(reference, Arc::new(table))?;
    }

    let df = ctx.sql(sql).await?;
    let schema = df.schema().inner().clone();
    let batches = df.collect().await?;

    Ok(Frame::new(schema, batches))
}
