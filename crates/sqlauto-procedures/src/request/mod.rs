//! Procedure requests
//!
//! A `ProcedureRequest` is the validated, ordered parameter list for one
//! stored procedure call. The `backup` and `restore` modules build them
//! from raw CLI input, applying defaults and validating each field.

mod backup;
mod fields;
mod restore;


pub use backup::BackupRequest;
pub use fields::{BackupMethod, BackupType, DatabaseType};
pub use restore::RestoreRequest;

use serde::Serialize;
use sqlauto_core::{Result, SqlautoError, Value};

/// Procedure that takes a database backup
pub const BACKUP_PROCEDURE: &str = "dbo.usp_THKBackupDb";

/// Procedure that restores a database from a backup file
pub const RESTORE_PROCEDURE: &str = "dbo.usp_THKRestoreDb";

/// How a SQL NULL argument is written on the command line and rendered
pub const NULL_MARKER: &str = "NULL";

/// Which procedure a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Backup,
    Restore,
}

impl ProcedureKind {
    pub fn procedure_name(&self) -> &'static str {
        match self {
            ProcedureKind::Backup => BACKUP_PROCEDURE,
            ProcedureKind::Restore => RESTORE_PROCEDURE,
        }
    }
}

impl std::fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcedureKind::Backup => write!(f, "backup"),
            ProcedureKind::Restore => write!(f, "restore"),
        }
    }
}

/// Raw, unvalidated procedure arguments as parsed from the command line
///
/// Fields that do not apply to the requested procedure are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProcedureArgs {
    pub database: Option<String>,
    pub client: Option<String>,
    pub database_type: Option<String>,
    // backup
    pub path: Option<String>,
    pub backup_type: Option<String>,
    pub method: Option<String>,
    pub retention: Option<i64>,
    pub media_set: Option<String>,
    pub new_media: Option<bool>,
    // restore
    pub filename: Option<String>,
    pub recovery: Option<bool>,
    pub create: Option<bool>,
    pub user_rights: Option<i64>,
}

/// A single named procedure argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureParam {
    pub name: String,
    pub value: Value,
}

impl ProcedureParam {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render as `@name=value`; NULL renders as the bare marker
    pub fn render(&self) -> String {
        format!("@{}={}", self.name, self.value)
    }
}

/// A validated stored procedure call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureRequest {
    procedure_name: String,
    params: Vec<ProcedureParam>,
}

impl ProcedureRequest {
    /// Create a request, rejecting malformed names and duplicate parameters
    pub fn new(procedure_name: impl Into<String>, params: Vec<ProcedureParam>) -> Result<Self> {
        let procedure_name = procedure_name.into();
        if procedure_name.split('.').any(|part| part.trim().is_empty()) {
            return Err(SqlautoError::validation(
                "procedure_name",
                format!("`{procedure_name}` is not a valid procedure name"),
            ));
        }

        for (idx, param) in params.iter().enumerate() {
            if !is_identifier(&param.name) {
                return Err(SqlautoError::validation(
                    param.name.clone(),
                    "is not a valid parameter name",
                ));
            }
            if params[..idx].iter().any(|p| p.name == param.name) {
                return Err(SqlautoError::validation(
                    param.name.clone(),
                    "parameter given more than once",
                ));
            }
        }

        Ok(Self {
            procedure_name,
            params,
        })
    }

    pub fn procedure_name(&self) -> &str {
        &self.procedure_name
    }

    pub fn params(&self) -> &[ProcedureParam] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Look a parameter value up by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Parameter names in declared order
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Canonical `@name=value,@name=value` rendering in declared order
    ///
    /// Used for logs and dry runs only. Execution always binds values as
    /// parameters.
    pub fn argument_list(&self) -> String {
        self.params
            .iter()
            .map(ProcedureParam::render)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for ProcedureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.procedure_name, self.argument_list())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate raw arguments and build the request for `kind`
///
/// No connection is opened here; validation errors surface before any
/// network activity.
pub fn build_procedure_request(
    kind: ProcedureKind,
    raw: &RawProcedureArgs,
) -> Result<ProcedureRequest> {
    let request = match kind {
        ProcedureKind::Backup => BackupRequest::from_raw(raw)?.into_request(),
        ProcedureKind::Restore => RestoreRequest::from_raw(raw)?.into_request(),
    }?;
    tracing::trace!(%kind, arguments = %request.argument_list(), "built procedure request");
    Ok(request)
}

/// Database name shared by both procedures, defaulting to `tempdb`
fn database_arg(raw: &RawProcedureArgs) -> Result<String> {
    match raw.database.as_deref() {
        None => Ok(sqlauto_core::DEFAULT_DATABASE.to_string()),
        value => fields::required_text("database", value),
    }
}

/// Client name, falling back to the database name
fn client_arg(raw: &RawProcedureArgs, database: &str) -> String {
    raw.client
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(database)
        .to_string()
}

fn database_type_arg(raw: &RawProcedureArgs) -> Result<DatabaseType> {
    raw.database_type
        .as_deref()
        .map(DatabaseType::parse)
        .transpose()
        .map(Option::unwrap_or_default)
}
