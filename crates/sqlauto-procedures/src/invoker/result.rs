use serde::Serialize;
use sqlauto_core::{QueryResult, Row};

use super::call::RETURN_VALUE_COLUMN;

/// Outcome of a successful procedure call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureResult {
    procedure: String,
    return_code: i32,
    rows: Vec<Row>,
}

impl ProcedureResult {
    pub fn new(procedure: impl Into<String>, return_code: i32, rows: Vec<Row>) -> Self {
        Self {
            procedure: procedure.into(),
            return_code,
            rows,
        }
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names across all rows, in first-seen order
    ///
    /// Procedures may return several result sets with different shapes.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for column in row.columns() {
                if !columns.contains(&column.as_str()) {
                    columns.push(column);
                }
            }
        }
        columns
    }
}

/// Split the trailing return-value result set off the ones the procedure produced
///
/// The batch always ends with a single-row `Return Value` select. Rows of every
/// earlier result set are kept in order.
pub(crate) fn split_return_code(
    mut result_sets: Vec<QueryResult>,
) -> std::result::Result<(i32, Vec<Row>), String> {
    let status = result_sets
        .pop()
        .ok_or_else(|| "the call produced no result sets".to_string())?;

    let value = status
        .rows
        .first()
        .and_then(|row| row.get_by_name(RETURN_VALUE_COLUMN))
        .ok_or_else(|| "the call did not report a return value".to_string())?;

    let code = value
        .as_i64()
        .ok_or_else(|| format!("return value `{value}` is not an integer"))?;
    let code = i32::try_from(code).map_err(|_| format!("return value {code} is out of range"))?;

    let rows = result_sets
        .into_iter()
        .flat_map(|set| set.rows)
        .collect();
    Ok((code, rows))
}
