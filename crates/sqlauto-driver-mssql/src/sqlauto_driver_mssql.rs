//! MS SQL Server driver for sqlauto
//!
//! This crate provides the production `Connector` for SQL Server, built on
//! tiberius. It resolves host and DSN descriptors into network endpoints,
//! runs parameterized statement batches, and maps TDS column data into
//! sqlauto values.

mod connection;
mod connector;

#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod connector_tests;

pub use connection::{MssqlConnection, MssqlConnectionError};
pub use connector::{Endpoint, MssqlConnector};
