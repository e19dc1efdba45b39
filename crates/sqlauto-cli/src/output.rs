//! Rendering results for the terminal

use anyhow::Result;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use sqlauto_core::ConnectionDescriptor;
use sqlauto_procedures::{ProcedureRequest, ProcedureResult};

use crate::args::OutputFormat;

pub fn render_result(result: &ProcedureResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Table => {
            let summary = format!(
                "{} returned {} ({} row{})",
                result.procedure(),
                result.return_code(),
                result.row_count(),
                if result.row_count() == 1 { "" } else { "s" }
            );
            if result.row_count() == 0 {
                return Ok(summary);
            }
            Ok(format!("{}\n{summary}", rows_table(result)))
        }
    }
}

fn rows_table(result: &ProcedureResult) -> Table {
    let columns = result.columns();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.clone());

    for row in result.rows() {
        table.add_row(columns.iter().map(|column| {
            row.get_by_name(column)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
    }
    table
}

#[derive(Serialize)]
struct DryRun<'a> {
    procedure: &'a str,
    arguments: String,
    connection: String,
}

/// What would run, without connecting
pub fn render_dry_run(
    request: &ProcedureRequest,
    descriptor: &ConnectionDescriptor,
    format: OutputFormat,
) -> Result<String> {
    let plan = DryRun {
        procedure: request.procedure_name(),
        arguments: request.argument_list(),
        connection: descriptor.connection_string(),
    };
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&plan)?),
        OutputFormat::Table => Ok(format!(
            "{} {}\n-- {}",
            plan.procedure, plan.arguments, plan.connection
        )),
    }
}
