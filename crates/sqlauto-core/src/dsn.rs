//! Named connection aliases (DSNs)
//!
//! A DSN is a locally stored, pre-configured connection target. Descriptors
//! built in DSN mode only carry the alias name; drivers resolve it against a
//! [`DsnRegistry`] when the connection is opened.

use crate::{Result, SqlautoError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single named connection alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsnEntry {
    /// Server host, optionally with an instance (`host\instance`)
    pub server: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database to connect to
    #[serde(default)]
    pub database: Option<String>,
    /// Login used when none is given on the command line
    #[serde(default)]
    pub username: Option<String>,
    /// Password used when none is given on the command line
    #[serde(default)]
    pub password: Option<String>,
    /// Accept self-signed server certificates
    #[serde(default)]
    pub trust_cert: bool,
}

fn default_port() -> u16 {
    crate::DEFAULT_PORT
}

impl DsnEntry {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_port(),
            database: None,
            username: None,
            password: None,
            trust_cert: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// Lookup table of DSN aliases, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DsnRegistry {
    entries: BTreeMap<String, DsnEntry>,
}

impl DsnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an alias
    pub fn insert(&mut self, name: impl Into<String>, entry: DsnEntry) {
        let name = name.into();
        tracing::debug!(dsn = %name, server = %entry.server, "registering dsn");
        self.entries.insert(name, entry);
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: DsnEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DsnEntry> {
        self.entries.get(name)
    }

    /// Look up an alias
    ///
    /// Unknown aliases and entries with a blank server are configuration
    /// errors.
    pub fn resolve(&self, name: &str) -> Result<&DsnEntry> {
        let entry = self.entries.get(name).ok_or_else(|| {
            SqlautoError::Configuration(format!("DSN `{name}` is not defined"))
        })?;
        if entry.server.trim().is_empty() {
            return Err(SqlautoError::Configuration(format!(
                "DSN `{name}` has an empty server"
            )));
        }
        Ok(entry)
    }

    /// List all alias names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_dsn() {
        let registry = DsnRegistry::new().with_entry(
            "reporting",
            DsnEntry::new("db01\\reports").with_database("reports"),
        );
        let entry = registry.resolve("reporting").unwrap();
        assert_eq!(entry.server, "db01\\reports");
        assert_eq!(entry.port, 1433);
        assert_eq!(entry.database.as_deref(), Some("reports"));
    }

    #[test]
    fn test_resolve_unknown_dsn_is_configuration_error() {
        let registry = DsnRegistry::new();
        let err = registry.resolve("nope").unwrap_err();
        assert!(matches!(err, SqlautoError::Configuration(_)));
    }

    #[test]
    fn test_resolve_blank_server_is_configuration_error() {
        let registry = DsnRegistry::new()
            .with_entry("empty", DsnEntry::new(""))
            .with_entry("spaces", DsnEntry::new("  "));
        for name in ["empty", "spaces"] {
            let err = registry.resolve(name).unwrap_err();
            assert!(matches!(err, SqlautoError::Configuration(_)), "{name}: {err}");
        }
    }

    #[test]
    fn test_registry_deserializes_from_toml_table() {
        let registry: DsnRegistry = toml::from_str(
            r#"
            [prod]
            server = "sql01"
            port = 14330
            database = "master"

            [dev]
            server = "localhost"
            trust_cert = true
            "#,
        )
        .unwrap();

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["dev", "prod"]);
        assert_eq!(registry.get("prod").unwrap().port, 14330);
        assert!(registry.get("dev").unwrap().trust_cert);
        assert_eq!(registry.get("dev").unwrap().port, 1433);
    }
}
