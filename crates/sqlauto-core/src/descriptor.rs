//! Connection descriptors
//!
//! A [`ConnectionDescriptor`] is built once per invocation from the raw
//! command-line fields and describes exactly one of two addressing modes:
//! an explicit host (server, port, database) or a named DSN alias.

use crate::{Result, SqlautoError};

/// Server used when none is supplied
pub const DEFAULT_SERVER: &str = "localhost";
/// Port used when none is supplied
pub const DEFAULT_PORT: u16 = 1433;
/// Database used when none is supplied
pub const DEFAULT_DATABASE: &str = "tempdb";
/// Driver used when none is supplied
pub const DEFAULT_DRIVER: &str = "mssql";

/// Connection fields as they arrive from the command line, before defaulting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConnectionArgs {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub dsn: Option<String>,
    pub driver: Option<String>,
    pub trust_cert: bool,
}

/// Where a connection goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Explicit host-based target
    Host {
        host: String,
        port: u16,
        database: String,
    },
    /// Named alias resolved by the driver at connect time
    Dsn { name: String },
}

/// Immutable description of how to reach the database
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    target: ConnectionTarget,
    username: String,
    password: String,
    driver_id: String,
    trust_cert: bool,
}

impl ConnectionDescriptor {
    /// Build a host-based descriptor directly
    pub fn host(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            target: ConnectionTarget::Host {
                host: host.into(),
                port,
                database: database.into(),
            },
            username: String::new(),
            password: String::new(),
            driver_id: DEFAULT_DRIVER.to_string(),
            trust_cert: false,
        }
    }

    /// Build a DSN-based descriptor directly
    pub fn dsn(name: impl Into<String>) -> Self {
        Self {
            target: ConnectionTarget::Dsn { name: name.into() },
            username: String::new(),
            password: String::new(),
            driver_id: DEFAULT_DRIVER.to_string(),
            trust_cert: false,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn is_dsn(&self) -> bool {
        matches!(self.target, ConnectionTarget::Dsn { .. })
    }

    pub fn host_name(&self) -> Option<&str> {
        match &self.target {
            ConnectionTarget::Host { host, .. } => Some(host),
            ConnectionTarget::Dsn { .. } => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match &self.target {
            ConnectionTarget::Host { port, .. } => Some(*port),
            ConnectionTarget::Dsn { .. } => None,
        }
    }

    pub fn database_name(&self) -> Option<&str> {
        match &self.target {
            ConnectionTarget::Host { database, .. } => Some(database),
            ConnectionTarget::Dsn { .. } => None,
        }
    }

    pub fn dsn_name(&self) -> Option<&str> {
        match &self.target {
            ConnectionTarget::Dsn { name } => Some(name),
            ConnectionTarget::Host { .. } => None,
        }
    }

    /// Login name; empty means integrated authentication
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn trust_cert(&self) -> bool {
        self.trust_cert
    }

    /// ADO-style connection string with the password redacted
    ///
    /// Intended for logs and error messages only.
    pub fn connection_string(&self) -> String {
        let mut parts = Vec::new();
        match &self.target {
            ConnectionTarget::Host {
                host,
                port,
                database,
            } => {
                parts.push(format!("Server={}", ado_quote(&format!("{host},{port}"))));
                parts.push(format!("Database={}", ado_quote(database)));
            }
            ConnectionTarget::Dsn { name } => {
                parts.push(format!("DSN={}", ado_quote(name)));
            }
        }

        if self.username.is_empty() {
            parts.push("Trusted_Connection=True".to_string());
        } else {
            parts.push(format!("User Id={}", ado_quote(&self.username)));
            parts.push("Password=***".to_string());
        }

        if self.trust_cert {
            parts.push("TrustServerCertificate=True".to_string());
        }

        parts.join(";")
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("target", &self.target)
            .field("username", &self.username)
            .field("password", &"***")
            .field("driver_id", &self.driver_id)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.connection_string())
    }
}

/// Quote a connection string value when it would otherwise break parsing
fn ado_quote(value: &str) -> String {
    let needs_quotes = value.contains([';', '"', '\''])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn non_blank(field: &str, value: Option<String>) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(SqlautoError::Configuration(format!(
            "`{field}` was given but is empty"
        ))),
        other => Ok(other),
    }
}

/// Turn raw command-line fields into a connection descriptor
///
/// Exactly one addressing mode must be selected. A DSN together with any of
/// server, port or database is rejected, as is a blank DSN, a blank server
/// or port 0. Without a DSN the host mode is chosen and missing fields fall
/// back to `localhost`, `1433` and `tempdb`. Missing credentials become
/// empty strings.
pub fn build_connection_descriptor(raw: RawConnectionArgs) -> Result<ConnectionDescriptor> {
    let dsn = non_blank("dsn", raw.dsn)?;
    let server = non_blank("server", raw.server)?;
    let database = non_blank("database", raw.database)?;

    let target = match dsn {
        Some(name) => {
            let mut conflicting = Vec::new();
            if server.is_some() {
                conflicting.push("server");
            }
            if raw.port.is_some() {
                conflicting.push("port");
            }
            if database.is_some() {
                conflicting.push("database");
            }
            if !conflicting.is_empty() {
                return Err(SqlautoError::Configuration(format!(
                    "DSN `{name}` cannot be combined with {}",
                    conflicting.join(", ")
                )));
            }
            ConnectionTarget::Dsn { name }
        }
        None => {
            let port = raw.port.unwrap_or(DEFAULT_PORT);
            if port == 0 {
                return Err(SqlautoError::Configuration(
                    "`port` must be between 1 and 65535".to_string(),
                ));
            }
            ConnectionTarget::Host {
                host: server.unwrap_or_else(|| DEFAULT_SERVER.to_string()),
                port,
                database: database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            }
        }
    };

    let driver_id = raw
        .driver
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DRIVER.to_string());

    let descriptor = ConnectionDescriptor {
        target,
        username: raw.username.unwrap_or_default(),
        password: raw.password.unwrap_or_default(),
        driver_id,
        trust_cert: raw.trust_cert,
    };
    tracing::debug!(descriptor = %descriptor, "built connection descriptor");
    Ok(descriptor)
}
