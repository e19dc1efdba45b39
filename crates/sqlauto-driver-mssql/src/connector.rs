//! Resolving descriptors to SQL Server endpoints

use async_trait::async_trait;
use sqlauto_core::{
    Connection, ConnectionDescriptor, ConnectionTarget, Connector, DsnRegistry, Result,
    SqlautoError,
};

use crate::connection::MssqlConnection;

/// Driver ids this connector accepts
const DRIVER_IDS: [&str; 3] = ["mssql", "sqlserver", "tds"];

/// A fully resolved network endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    /// Named instance, looked up through the SQL Server Browser
    pub instance: Option<String>,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub trust_cert: bool,
}

impl Endpoint {
    /// Resolve a descriptor, looking DSN aliases up in `dsns`
    ///
    /// Credentials given on the descriptor win over the ones stored with a
    /// DSN. A DSN without a database connects to `tempdb`.
    pub fn resolve(descriptor: &ConnectionDescriptor, dsns: &DsnRegistry) -> Result<Self> {
        let driver = descriptor.driver_id();
        if !DRIVER_IDS.iter().any(|id| id.eq_ignore_ascii_case(driver)) {
            return Err(SqlautoError::Configuration(format!(
                "driver `{driver}` is not supported; expected one of {}",
                DRIVER_IDS.join(", ")
            )));
        }

        let (server, port, database, username, password, trust_cert) = match descriptor.target() {
            ConnectionTarget::Host {
                host,
                port,
                database,
            } => (
                host.clone(),
                *port,
                database.clone(),
                descriptor.username().to_string(),
                descriptor.password().to_string(),
                descriptor.trust_cert(),
            ),
            ConnectionTarget::Dsn { name } => {
                let entry = dsns.resolve(name)?;
                let (username, password) = if descriptor.username().is_empty() {
                    (
                        entry.username.clone().unwrap_or_default(),
                        entry.password.clone().unwrap_or_default(),
                    )
                } else {
                    (
                        descriptor.username().to_string(),
                        descriptor.password().to_string(),
                    )
                };
                (
                    entry.server.clone(),
                    entry.port,
                    entry
                        .database
                        .clone()
                        .unwrap_or_else(|| sqlauto_core::DEFAULT_DATABASE.to_string()),
                    username,
                    password,
                    descriptor.trust_cert() || entry.trust_cert,
                )
            }
        };

        let (host, instance) = match server.split_once('\\') {
            Some((host, instance)) if !instance.is_empty() => {
                (host.to_string(), Some(instance.to_string()))
            }
            Some((host, _)) => (host.to_string(), None),
            None => (server.clone(), None),
        };
        let host = if host.is_empty() || host == "." {
            sqlauto_core::DEFAULT_SERVER.to_string()
        } else {
            host
        };

        Ok(Self {
            host,
            instance,
            port,
            database,
            username,
            password,
            trust_cert,
        })
    }

    /// Human readable address, for logs
    pub fn address(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}\\{}", self.host, instance),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("instance", &self.instance)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("trust_cert", &self.trust_cert)
            .finish_non_exhaustive()
    }
}

/// Opens tiberius connections for descriptors
#[derive(Debug, Clone, Default)]
pub struct MssqlConnector {
    dsns: DsnRegistry,
}

impl MssqlConnector {
    /// Create a connector that knows no DSN aliases
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector that resolves DSN descriptors against `dsns`
    pub fn with_dsns(dsns: DsnRegistry) -> Self {
        Self { dsns }
    }

    pub fn dsns(&self) -> &DsnRegistry {
        &self.dsns
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    #[tracing::instrument(skip(self, descriptor), fields(conn = %descriptor))]
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>> {
        let endpoint = Endpoint::resolve(descriptor, &self.dsns)?;
        tracing::debug!(address = %endpoint.address(), "resolved endpoint");
        let connection = MssqlConnection::connect(&endpoint).await?;
        Ok(Box::new(connection))
    }
}
