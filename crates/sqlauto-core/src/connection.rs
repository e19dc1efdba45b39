//! Connection and connector traits

use crate::{ConnectionDescriptor, QueryResult, Result, Value};
use async_trait::async_trait;

/// An open database connection
///
/// Implementations hold exactly one server session. The invoker owns the
/// connection for the duration of a single call and always calls
/// [`Connection::close`] before dropping it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mssql")
    fn driver_name(&self) -> &str;

    /// Run a statement batch and return every result set it produced, in order
    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<QueryResult>>;

    /// Commit any transaction left open by the last batch
    async fn commit(&self) -> Result<()>;

    /// Roll back any transaction left open by the last batch
    async fn rollback(&self) -> Result<()>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// Opens connections for a descriptor
///
/// This is the seam test doubles plug into; the SQL Server driver provides
/// the production implementation.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection described by `descriptor`
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>>;
}
