//! sqlauto core - connection, value and error types
//!
//! This crate provides the abstractions every other sqlauto crate depends
//! on:
//!
//! - `Connection` / `Connector` - traits implemented by database drivers
//! - `ConnectionDescriptor` - how to reach the server (host or DSN)
//! - `DsnRegistry` - locally configured connection aliases
//! - `Value`, `Row`, `QueryResult` - driver-neutral data
//! - `SqlautoError` - the error taxonomy shared by all crates

mod connection;
mod descriptor;
mod dsn;
mod error;
mod types;


pub use connection::*;
pub use descriptor::*;
pub use dsn::*;
pub use error::*;
pub use types::*;
