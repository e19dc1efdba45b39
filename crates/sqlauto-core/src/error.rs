//! Error types for sqlauto

use thiserror::Error;

/// Core error type for sqlauto operations
///
/// Every variant is fatal to the current invocation. Nothing in the library
/// retries; callers decide how to report the failure.
#[derive(Error, Debug)]
pub enum SqlautoError {
    /// Contradictory or incomplete connection parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A request field failed its domain constraint
    #[error("Invalid value for `{field}`: {message}")]
    Validation { field: String, message: String },

    /// The server could not be reached or the login was rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// The stored procedure ran and failed, or failed while running
    #[error("{}", procedure_message(.procedure, .code, .message))]
    Procedure {
        procedure: String,
        code: Option<i32>,
        message: String,
    },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,
}

fn procedure_message(procedure: &str, code: &Option<i32>, message: &str) -> String {
    match code {
        Some(code) => format!("Procedure {procedure} returned {code}: {message}"),
        None => format!("Procedure {procedure} failed: {message}"),
    }
}

impl SqlautoError {
    /// Build a validation error for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a procedure error for a non-zero return code
    pub fn return_code(procedure: impl Into<String>, code: i32) -> Self {
        Self::Procedure {
            procedure: procedure.into(),
            code: Some(code),
            message: "non-zero return code".to_string(),
        }
    }

    /// Build a procedure error for a failure raised while the call was running
    pub fn procedure_failed(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Procedure {
            procedure: procedure.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Name of the offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Return code carried by a procedure error, if the procedure got that far
    pub fn procedure_code(&self) -> Option<i32> {
        match self {
            Self::Procedure { code, .. } => *code,
            _ => None,
        }
    }
}

/// Result type alias for sqlauto operations
pub type Result<T> = std::result::Result<T, SqlautoError>;
