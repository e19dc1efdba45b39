//! Configuration file
//!
//! ```toml
//! [connection]
//! server = "sql01"
//! username = "svc_backup"
//! trust_cert = true
//!
//! [dsn.reporting]
//! server = "sql02\\reports"
//! database = "reports"
//! ```
//!
//! Values given on the command line (or through the environment) win over
//! `[connection]`, which wins over the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlauto_core::{DsnRegistry, RawConnectionArgs, SqlautoError};

use crate::args::ConnectionFlags;

/// Default connection settings from `[connection]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDefaults {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub dsn: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub driver: Option<String>,
    #[serde(default)]
    pub trust_cert: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub connection: ConnectionDefaults,
    #[serde(default)]
    pub dsn: DsnRegistry,
}

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("sqlauto"))
}

pub fn config_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

impl FileConfig {
    /// Load `path`, or the default file when no path is given
    ///
    /// An explicit path must exist; a missing default file means no
    /// configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match config_file() {
                Ok(path) => (path, false),
                Err(err) => {
                    tracing::debug!(error = %err, "no configuration directory");
                    return Ok(Self::default());
                }
            },
        };

        if !explicit && !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|err| {
            SqlautoError::Configuration(format!("cannot read {}: {err}", path.display()))
        })?;
        let config = Self::parse(&contents).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), dsns = config.dsn.names().count(), "loaded configuration");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(contents)
            .map_err(|err| SqlautoError::Configuration(err.to_string().trim_end().to_string()))?;

        let defaults = &config.connection;
        if defaults.dsn.is_some()
            && (defaults.server.is_some() || defaults.port.is_some() || defaults.database.is_some())
        {
            return Err(SqlautoError::Configuration(
                "[connection] sets both dsn and server, port or database".to_string(),
            )
            .into());
        }
        Ok(config)
    }

    /// Merge command line flags over the `[connection]` defaults
    ///
    /// Host fields from the file are not used when a DSN is selected, and
    /// the file's DSN is not used when the command line names a host.
    pub fn connection_args(&self, flags: &ConnectionFlags) -> RawConnectionArgs {
        let defaults = &self.connection;
        let host_given = flags.server.is_some() || flags.port.is_some() || flags.database.is_some();
        let dsn = flags
            .dsn
            .clone()
            .or_else(|| (!host_given).then(|| defaults.dsn.clone()).flatten());

        let (server, port, database) = if dsn.is_some() {
            (flags.server.clone(), flags.port, flags.database.clone())
        } else {
            (
                flags.server.clone().or_else(|| defaults.server.clone()),
                flags.port.or(defaults.port),
                flags.database.clone().or_else(|| defaults.database.clone()),
            )
        };

        RawConnectionArgs {
            server,
            port,
            database,
            username: flags.username.clone().or_else(|| defaults.username.clone()),
            password: flags.password.clone().or_else(|| defaults.password.clone()),
            dsn,
            driver: defaults.driver.clone(),
            trust_cert: flags.trust_cert || defaults.trust_cert,
        }
    }

    /// Database the procedure acts on
    ///
    /// In DSN mode this is the database stored with the DSN, and the DSN
    /// must be defined.
    pub fn target_database(&self, connection: &RawConnectionArgs) -> Result<Option<String>> {
        match &connection.dsn {
            Some(name) => Ok(self.dsn.resolve(name)?.database.clone()),
            None => Ok(connection.database.clone()),
        }
    }
}
