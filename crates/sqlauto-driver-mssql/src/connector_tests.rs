//! Tests for endpoint resolution

use crate::connector::{Endpoint, MssqlConnector};
use pretty_assertions::assert_eq;
use sqlauto_core::{
    ConnectionDescriptor, Connector, DsnEntry, DsnRegistry, RawConnectionArgs, SqlautoError,
    build_connection_descriptor,
};

fn registry() -> DsnRegistry {
    DsnRegistry::new()
        .with_entry(
            "reporting",
            DsnEntry::new("sql01\\reports")
                .with_database("reports")
                .with_credentials("svc_reports", "from-dsn"),
        )
        .with_entry("plain", DsnEntry::new("sql02").with_port(14330))
}

#[test]
fn test_resolve_host_descriptor() {
    let descriptor = ConnectionDescriptor::host("db01", 1433, "mydb")
        .with_credentials("login", "secret")
        .with_trust_cert(true);

    let endpoint = Endpoint::resolve(&descriptor, &DsnRegistry::new()).unwrap();

    assert_eq!(endpoint.host, "db01");
    assert_eq!(endpoint.instance, None);
    assert_eq!(endpoint.port, 1433);
    assert_eq!(endpoint.database, "mydb");
    assert_eq!(endpoint.username, "login");
    assert_eq!(endpoint.password, "secret");
    assert!(endpoint.trust_cert);
    assert_eq!(endpoint.address(), "db01:1433");
}

#[test]
fn test_resolve_splits_named_instance() {
    let descriptor = ConnectionDescriptor::host("localhost\\myinstance", 1433, "mydb");
    let endpoint = Endpoint::resolve(&descriptor, &DsnRegistry::new()).unwrap();

    assert_eq!(endpoint.host, "localhost");
    assert_eq!(endpoint.instance.as_deref(), Some("myinstance"));
    assert_eq!(endpoint.address(), "localhost\\myinstance");
}

#[test]
fn test_resolve_dot_means_localhost() {
    let descriptor = ConnectionDescriptor::host(".\\SQLEXPRESS", 1433, "mydb");
    let endpoint = Endpoint::resolve(&descriptor, &DsnRegistry::new()).unwrap();
    assert_eq!(endpoint.host, "localhost");
    assert_eq!(endpoint.instance.as_deref(), Some("SQLEXPRESS"));
}

#[test]
fn test_resolve_dsn_uses_stored_credentials() {
    let descriptor = ConnectionDescriptor::dsn("reporting");
    let endpoint = Endpoint::resolve(&descriptor, &registry()).unwrap();

    assert_eq!(endpoint.host, "sql01");
    assert_eq!(endpoint.instance.as_deref(), Some("reports"));
    assert_eq!(endpoint.database, "reports");
    assert_eq!(endpoint.username, "svc_reports");
    assert_eq!(endpoint.password, "from-dsn");
}

#[test]
fn test_resolve_dsn_prefers_descriptor_credentials() {
    let descriptor = ConnectionDescriptor::dsn("reporting").with_credentials("operator", "typed");
    let endpoint = Endpoint::resolve(&descriptor, &registry()).unwrap();

    assert_eq!(endpoint.username, "operator");
    assert_eq!(endpoint.password, "typed");
}

#[test]
fn test_resolve_dsn_without_database_uses_tempdb() {
    let descriptor = ConnectionDescriptor::dsn("plain");
    let endpoint = Endpoint::resolve(&descriptor, &registry()).unwrap();

    assert_eq!(endpoint.port, 14330);
    assert_eq!(endpoint.database, "tempdb");
}

#[test]
fn test_resolve_unknown_dsn_is_configuration_error() {
    let descriptor = ConnectionDescriptor::dsn("missing");
    let err = Endpoint::resolve(&descriptor, &registry()).unwrap_err();
    assert!(matches!(err, SqlautoError::Configuration(_)));
}

#[test]
fn test_resolve_dsn_with_blank_server_is_configuration_error() {
    let dsns = DsnRegistry::new().with_entry("blank", DsnEntry::new(""));
    let err = Endpoint::resolve(&ConnectionDescriptor::dsn("blank"), &dsns).unwrap_err();
    assert!(matches!(err, SqlautoError::Configuration(_)), "{err}");
}

#[test]
fn test_resolve_rejects_unknown_driver() {
    let descriptor = build_connection_descriptor(RawConnectionArgs {
        driver: Some("oracle".into()),
        ..Default::default()
    })
    .unwrap();
    let err = Endpoint::resolve(&descriptor, &DsnRegistry::new()).unwrap_err();
    assert!(matches!(err, SqlautoError::Configuration(_)), "{err}");
}

#[test]
fn test_endpoint_debug_hides_password() {
    let descriptor = ConnectionDescriptor::host("db01", 1433, "mydb").with_credentials("u", "hunter2");
    let endpoint = Endpoint::resolve(&descriptor, &DsnRegistry::new()).unwrap();
    assert!(!format!("{endpoint:?}").contains("hunter2"));
}

#[tokio::test]
async fn test_connector_fails_before_network_for_unknown_dsn() {
    let connector = MssqlConnector::with_dsns(registry());
    let result = connector.connect(&ConnectionDescriptor::dsn("missing")).await;
    assert!(matches!(result, Err(SqlautoError::Configuration(_))));
}
