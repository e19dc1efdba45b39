//! sqlauto - run the SQL Server backup and restore procedures
//!
//! ```text
//! sqlauto -s sql01 -d mydb backup -t full -r 14
//! sqlauto -D reporting restore -f reports_full.bak --recovery
//! ```

mod args;
mod config;
mod exit;
mod logging;
mod output;

#[cfg(test)]
mod args_tests;
#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod output_tests;
#[cfg(test)]
mod plan_tests;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use sqlauto_core::{ConnectionDescriptor, DsnRegistry, build_connection_descriptor};
use sqlauto_driver_mssql::MssqlConnector;
use sqlauto_procedures::{ProcedureInvoker, ProcedureRequest, build_procedure_request};

use args::Cli;
use config::FileConfig;

/// A validated invocation, ready to run
#[derive(Debug)]
struct Plan {
    request: ProcedureRequest,
    descriptor: ConnectionDescriptor,
    dsns: DsnRegistry,
}

/// Resolve configuration and validate every argument without connecting
fn plan(cli: &Cli, config: FileConfig) -> Result<Plan> {
    let connection = config.connection_args(&cli.connection);

    let mut procedure_args = cli.command.procedure_args();
    procedure_args.database = config.target_database(&connection)?;
    procedure_args.client = cli.client.clone();

    let request = build_procedure_request(cli.command.kind(), &procedure_args)?;
    let descriptor = build_connection_descriptor(connection)?;

    Ok(Plan {
        request,
        descriptor,
        dsns: config.dsn,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let config = FileConfig::load(cli.config.as_deref())?;
    let plan = plan(&cli, config)?;

    if cli.dry_run {
        println!(
            "{}",
            output::render_dry_run(&plan.request, &plan.descriptor, cli.format)?
        );
        return Ok(());
    }

    tracing::info!(
        procedure = plan.request.procedure_name(),
        arguments = %plan.request.argument_list(),
        "invoking"
    );
    let invoker = ProcedureInvoker::new(MssqlConnector::with_dsns(plan.dsns));
    let result = invoker
        .execute_until(&plan.descriptor, plan.request, interrupted())
        .await?;

    println!("{}", output::render_result(&result, cli.format)?);
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit::exit_code(&err)
        }
    }
}
