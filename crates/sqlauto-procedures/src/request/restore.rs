use serde::Serialize;
use sqlauto_core::Result;

use super::fields::{self, DatabaseType};
use super::{
    ProcedureParam, ProcedureRequest, RESTORE_PROCEDURE, RawProcedureArgs, client_arg,
    database_arg, database_type_arg,
};

/// Rights level granted to users of the restored database by default
pub const DEFAULT_USER_RIGHTS: i32 = 1;

/// Arguments of `dbo.usp_THKRestoreDb`
///
/// The parameter order is reconstructed from the documented restore flags
/// and should be checked against the deployed procedure signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreRequest {
    pub database: String,
    pub client: String,
    pub filename: String,
    /// Leave the database ready for use instead of staged for log restores
    pub recovery: bool,
    /// Create the database if it does not exist
    pub create: bool,
    pub user_rights: i32,
    pub database_type: DatabaseType,
}

impl RestoreRequest {
    pub fn from_raw(raw: &RawProcedureArgs) -> Result<Self> {
        // filename is checked first so it is reported regardless of other fields
        let filename = fields::required_text("filename", raw.filename.as_deref())?;
        let database = database_arg(raw)?;
        let client = client_arg(raw, &database);
        let user_rights = match raw.user_rights {
            Some(rights) => fields::non_negative("user_rights", rights)?,
            None => DEFAULT_USER_RIGHTS,
        };

        Ok(Self {
            database,
            client,
            filename,
            recovery: raw.recovery.unwrap_or(false),
            create: raw.create.unwrap_or(false),
            user_rights,
            database_type: database_type_arg(raw)?,
        })
    }

    /// Parameters in the procedure's declared order
    pub fn into_request(self) -> Result<ProcedureRequest> {
        ProcedureRequest::new(
            RESTORE_PROCEDURE,
            vec![
                ProcedureParam::new("database", self.database),
                ProcedureParam::new("client", self.client),
                ProcedureParam::new("filename", self.filename),
                ProcedureParam::new("recovery", self.recovery),
                ProcedureParam::new("create", self.create),
                ProcedureParam::new("user_rights", self.user_rights),
                ProcedureParam::new("database_type", self.database_type.code()),
            ],
        )
    }
}
