//! Integration tests for endpoint resolution and probing.
//!
//! Probes target addresses that refuse connections, so these run offline.

use std::time::Duration;

use strata::prelude::*;
use strata::migrate::TransportSecurity;

#[test]
fn test_resolution_property() {
    let desc = ConnectionResolver::new()
        .base_domain("example-base.co")
        .resolve("https://proj123.example-base.co", "secret")
        .unwrap();

    assert_eq!(desc.host, "db.proj123.example-base.co");
    assert_eq!(desc.port, 5432);
    assert!(!format!("{desc:?}").contains("secret"));
}

#[test]
fn test_malformed_endpoint() {
    let err = ConnectionResolver::new()
        .resolve("not-a-url", "secret")
        .unwrap_err();
    assert!(err.to_string().contains("not-a-url"));
}

#[tokio::test]
async fn test_direct_probe_unreachable() {
    let config = PgConfig::from_url("postgres://postgres:pw@127.0.0.1:1/postgres")
        .unwrap()
        .with_ssl_mode(TransportSecurity::Disable)
        .with_connect_timeout(Duration::from_secs(2));

    let result = DirectBackend::new(config).probe().await;
    assert!(!result.ok);
    assert!(!result.detail.is_empty());
}

#[tokio::test]
async fn test_rpc_probe_unreachable() {
    let transport =
        PostgrestTransport::new("http://127.0.0.1:1", "key", Duration::from_secs(2)).unwrap();

    let result = RpcBackend::new(transport, RpcConfig::default())
        .probe()
        .await;
    assert!(!result.ok);
    assert!(!result.detail.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_halts_run() {
    let scripts = ScriptSet::from_scripts([
        Script::new("01.sql", "SELECT 1"),
        Script::new("02.sql", "SELECT 2"),
    ])
    .unwrap();
    let transport =
        PostgrestTransport::new("http://127.0.0.1:1", "key", Duration::from_secs(2)).unwrap();
    let backend = RpcBackend::new(transport, RpcConfig::default());

    let report = MigrationRunner::default()
        .run(RunContext::new(&scripts, &backend), &mut NoopObserver)
        .await;

    assert!(report.is_halted());
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].message.starts_with("Error in 01.sql: "));
}
