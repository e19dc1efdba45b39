//! Process exit codes

use std::process::ExitCode;

use sqlauto_core::SqlautoError;

pub const CONFIGURATION: u8 = 2;
pub const VALIDATION: u8 = 3;
pub const CONNECTION: u8 = 4;
pub const PROCEDURE: u8 = 5;
pub const CANCELLED: u8 = 130;
pub const OTHER: u8 = 1;

/// Exit code for an error, looking through any added context
pub fn code_for(err: &anyhow::Error) -> u8 {
    let Some(err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SqlautoError>())
    else {
        return OTHER;
    };
    match err {
        SqlautoError::Configuration(_) => CONFIGURATION,
        SqlautoError::Validation { .. } => VALIDATION,
        SqlautoError::Connection(_) => CONNECTION,
        SqlautoError::Procedure { .. } => PROCEDURE,
        SqlautoError::Cancelled => CANCELLED,
        SqlautoError::Driver(_) | SqlautoError::Io(_) => OTHER,
    }
}

pub fn exit_code(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(code_for(err))
}
