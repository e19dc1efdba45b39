//! Enumerated procedure arguments and their validation

use serde::Serialize;
use sqlauto_core::{Result, SqlautoError};

/// Type of backup being taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    #[default]
    Full,
    Diff,
    Log,
}

impl BackupType {
    pub const ALL: [BackupType; 3] = [BackupType::Full, BackupType::Diff, BackupType::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupType::Full => "full",
            BackupType::Diff => "diff",
            BackupType::Log => "log",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                SqlautoError::validation(
                    "backup_type",
                    format!("`{value}` is not one of full, diff, log"),
                )
            })
    }
}

/// How the backup is performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackupMethod {
    #[default]
    Native,
    Litespeed,
}

impl BackupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMethod::Native => "native",
            BackupMethod::Litespeed => "litespeed",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "native" => Ok(BackupMethod::Native),
            "litespeed" => Ok(BackupMethod::Litespeed),
            other => Err(SqlautoError::validation(
                "method",
                format!("`{other}` is not one of native, litespeed"),
            )),
        }
    }
}

/// Kind of database being backed up or restored
///
/// The procedures take the single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum DatabaseType {
    #[default]
    Live,
    Test,
    Staging,
    Conversion,
    Qa,
    Dev,
    Other,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 7] = [
        DatabaseType::Live,
        DatabaseType::Test,
        DatabaseType::Staging,
        DatabaseType::Conversion,
        DatabaseType::Qa,
        DatabaseType::Dev,
        DatabaseType::Other,
    ];

    /// Single-letter code passed to the procedures
    pub fn code(&self) -> &'static str {
        match self {
            DatabaseType::Live => "L",
            DatabaseType::Test => "T",
            DatabaseType::Staging => "S",
            DatabaseType::Conversion => "C",
            DatabaseType::Qa => "Q",
            DatabaseType::Dev => "D",
            DatabaseType::Other => "O",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatabaseType::Live => "live",
            DatabaseType::Test => "test",
            DatabaseType::Staging => "staging",
            DatabaseType::Conversion => "conversion",
            DatabaseType::Qa => "qa",
            DatabaseType::Dev => "dev",
            DatabaseType::Other => "other",
        }
    }

    /// Accepts either the code (`L`) or the lowercase name (`live`)
    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == value || t.name() == value)
            .ok_or_else(|| {
                SqlautoError::validation(
                    "database_type",
                    format!("`{value}` is not one of L, T, S, C, Q, D, O"),
                )
            })
    }
}

/// Check that an integer argument is non-negative and fits the procedure's `int`
pub(crate) fn non_negative(field: &str, value: i64) -> Result<i32> {
    if value < 0 {
        return Err(SqlautoError::validation(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    i32::try_from(value)
        .map_err(|_| SqlautoError::validation(field, format!("{value} is too large")))
}

/// Reject values that are present but blank
pub(crate) fn required_text(field: &str, value: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        Some(_) => Err(SqlautoError::validation(field, "must not be empty")),
        None => Err(SqlautoError::validation(field, "is required")),
    }
}
