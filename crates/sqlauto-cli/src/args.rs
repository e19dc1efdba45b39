//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sqlauto_procedures::{ProcedureKind, RawProcedureArgs};

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlauto", version, about = "Run the SQL Server backup and restore procedures")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionFlags,

    /// Client name passed to the procedure (defaults to the database name)
    #[arg(short, long, global = true)]
    pub client: Option<String>,

    /// Configuration file (defaults to <config dir>/sqlauto/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// More log output, repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format for result rows
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Print the procedure call without connecting
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where to connect
///
/// A DSN cannot be combined with an explicit server, port or database.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConnectionFlags {
    /// Server host name, `host\instance` for a named instance
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Server port
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Database to back up or restore
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Named connection from the configuration file
    #[arg(
        short = 'D',
        long,
        conflicts_with_all = ["server", "port", "database"],
        global = true
    )]
    pub dsn: Option<String>,

    /// Login name (empty for integrated authentication)
    #[arg(short, long, env = "SQLAUTO_USERNAME", global = true)]
    pub username: Option<String>,

    /// Login password
    #[arg(
        short = 'a',
        long,
        env = "SQLAUTO_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,

    /// Accept the server certificate without validation
    #[arg(long, global = true)]
    pub trust_cert: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Back a database up with dbo.usp_THKBackupDb
    Backup(BackupArgs),
    /// Restore a database with dbo.usp_THKRestoreDb
    Restore(RestoreArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BackupArgs {
    /// Backup directory
    #[arg(short = 'P', long)]
    pub path: Option<String>,

    /// full, diff or log
    #[arg(short = 't', long)]
    pub backup_type: Option<String>,

    /// native or litespeed
    #[arg(short, long)]
    pub method: Option<String>,

    /// Database type code (L, T, S, C, Q, D, O) or name
    #[arg(short = 'T', long)]
    pub database_type: Option<String>,

    /// Days to keep the backup
    #[arg(short, long, allow_negative_numbers = true)]
    pub retention: Option<i64>,

    /// Media set name
    #[arg(short = 'M', long)]
    pub media_set: Option<String>,

    /// Append to the existing media set instead of starting a new one
    #[arg(short, long)]
    pub no_new_media: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RestoreArgs {
    /// Backup file to restore from (required)
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Leave the database ready for use (RECOVERY)
    #[arg(short = 'R', long)]
    pub recovery: bool,

    /// Create the database if it does not exist
    #[arg(short = 'C', long)]
    pub create: bool,

    /// Rights level granted on the restored database
    #[arg(short = 'U', long, allow_negative_numbers = true)]
    pub user_rights: Option<i64>,

    /// Database type code (L, T, S, C, Q, D, O) or name
    #[arg(short = 'T', long)]
    pub database_type: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Cli {
    /// Log level for sqlauto's own crates
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Command {
    pub fn kind(&self) -> ProcedureKind {
        match self {
            Command::Backup(_) => ProcedureKind::Backup,
            Command::Restore(_) => ProcedureKind::Restore,
        }
    }

    /// Procedure arguments from this subcommand
    ///
    /// Database and client come from the global flags and are filled in by
    /// the caller.
    pub fn procedure_args(&self) -> RawProcedureArgs {
        match self {
            Command::Backup(args) => RawProcedureArgs {
                path: args.path.clone(),
                backup_type: args.backup_type.clone(),
                method: args.method.clone(),
                database_type: args.database_type.clone(),
                retention: args.retention,
                media_set: args.media_set.clone(),
                new_media: Some(!args.no_new_media),
                ..Default::default()
            },
            Command::Restore(args) => RawProcedureArgs {
                filename: args.filename.clone(),
                recovery: Some(args.recovery),
                create: Some(args.create),
                user_rights: args.user_rights,
                database_type: args.database_type.clone(),
                ..Default::default()
            },
        }
    }
}
