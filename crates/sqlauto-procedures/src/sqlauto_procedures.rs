//! Backup and restore procedure invocation
//!
//! Turns raw command line input into a validated [`ProcedureRequest`] for
//! `dbo.usp_THKBackupDb` or `dbo.usp_THKRestoreDb` and runs it through a
//! [`ProcedureInvoker`]. The invoker is generic over the core `Connector`
//! trait so it can be driven by the SQL Server driver or a test double.

mod invoker;
mod request;

pub use invoker::{
    CallBatch, ProcedureInvoker, ProcedureResult, RETURN_VALUE_COLUMN, quote_object_name,
};
pub use request::{
    BACKUP_PROCEDURE, BackupMethod, BackupRequest, BackupType, DatabaseType, NULL_MARKER,
    ProcedureKind, ProcedureParam, ProcedureRequest, RESTORE_PROCEDURE, RawProcedureArgs,
    RestoreRequest, build_procedure_request,
};
pub use sqlauto_core::{ConnectionDescriptor, RawConnectionArgs, build_connection_descriptor};
