use serde::Serialize;
use sqlauto_core::{Result, Value};

use super::fields::{self, BackupMethod, BackupType, DatabaseType};
use super::{
    BACKUP_PROCEDURE, NULL_MARKER, ProcedureParam, ProcedureRequest, RawProcedureArgs,
    client_arg, database_arg, database_type_arg,
};

/// Backup directory used when none is given; the procedure resolves it
pub const DEFAULT_BACKUP_PATH: &str = "default";

/// Days a backup is kept when no retention is given
pub const DEFAULT_RETENTION_DAYS: i32 = 90;

/// Arguments of `dbo.usp_THKBackupDb`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupRequest {
    pub database: String,
    pub client: String,
    pub path: String,
    pub backup_type: BackupType,
    pub method: BackupMethod,
    pub database_type: DatabaseType,
    pub retention: i32,
    /// `None` is passed to the procedure as SQL NULL
    pub media_set: Option<String>,
    pub new_media: bool,
}

impl BackupRequest {
    pub fn from_raw(raw: &RawProcedureArgs) -> Result<Self> {
        let database = database_arg(raw)?;
        let client = client_arg(raw, &database);

        let path = match raw.path.as_deref() {
            None => DEFAULT_BACKUP_PATH.to_string(),
            value => fields::required_text("path", value)?,
        };
        let backup_type = raw
            .backup_type
            .as_deref()
            .map(BackupType::parse)
            .transpose()?
            .unwrap_or_default();
        let method = raw
            .method
            .as_deref()
            .map(BackupMethod::parse)
            .transpose()?
            .unwrap_or_default();
        let database_type = database_type_arg(raw)?;
        let retention = match raw.retention {
            Some(days) => fields::non_negative("retention", days)?,
            None => DEFAULT_RETENTION_DAYS,
        };
        // An explicit `NULL` means the same as leaving the media set out
        let media_set = raw.media_set.clone().filter(|m| m != NULL_MARKER);

        Ok(Self {
            database,
            client,
            path,
            backup_type,
            method,
            database_type,
            retention,
            media_set,
            new_media: raw.new_media.unwrap_or(true),
        })
    }

    /// Parameters in the procedure's declared order
    pub fn into_request(self) -> Result<ProcedureRequest> {
        let media_set = self.media_set.map(Value::String).unwrap_or(Value::Null);
        ProcedureRequest::new(
            BACKUP_PROCEDURE,
            vec![
                ProcedureParam::new("database", self.database),
                ProcedureParam::new("client", self.client),
                ProcedureParam::new("path", self.path),
                ProcedureParam::new("backup_type", self.backup_type.as_str()),
                ProcedureParam::new("method", self.method.as_str()),
                ProcedureParam::new("database_type", self.database_type.code()),
                ProcedureParam::new("retention", self.retention),
                ProcedureParam::new("media_set", media_set),
                ProcedureParam::new("new_media", self.new_media),
            ],
        )
    }
}
