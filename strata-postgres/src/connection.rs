//! Scoped PostgreSQL sessions.
//!
//! Every script gets its own session: open, execute, commit, drop. There is
//! no pool and no reuse across scripts. Dropping a [`PgConnection`] on any
//! path, success or error, stops its background driver task.

use tokio::task::JoinHandle;
use tokio_postgres::Client;
use tracing::debug;

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};
use crate::tls::make_connector;

/// A single PostgreSQL session owning its driver task.
pub struct PgConnection {
    client: Client,
    driver: JoinHandle<()>,
    target: String,
}

impl PgConnection {
    /// Open a session.
    pub async fn connect(config: &PgConfig) -> PgResult<Self> {
        let target = config.target();
        debug!(target = %target, ssl_mode = %config.ssl_mode, "Opening PostgreSQL session");

        let connector = make_connector(config)?;
        let pg_config = config.to_pg_config();
        let connect = pg_config.connect(connector);

        let (client, connection) = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| PgError::Timeout(config.connect_timeout.as_millis() as u64))??;

        let driver_target = target.clone();
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(target = %driver_target, error = %e, "PostgreSQL session ended with error");
            }
        });

        Ok(Self {
            client,
            driver,
            target,
        })
    }

    /// `host:port/database` of this session.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Execute a batch of statements in a single round-trip.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(bytes = sql.len(), "Executing batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Run a query returning one text column of one row.
    pub async fn query_scalar_text(&self, sql: &str) -> PgResult<String> {
        debug!(sql = %sql, "Executing query_scalar_text");
        let row = self.client.query_one(sql, &[]).await?;
        Ok(row.try_get::<_, String>(0)?)
    }

    /// Begin a transaction.
    pub async fn transaction(&mut self) -> PgResult<PgTransaction<'_>> {
        debug!("Beginning transaction");
        let txn = self.client.transaction().await?;
        Ok(PgTransaction { txn })
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        self.driver.abort();
        debug!(target = %self.target, "PostgreSQL session closed");
    }
}

/// A PostgreSQL transaction. Dropped without commit, it rolls back.
pub struct PgTransaction<'a> {
    txn: tokio_postgres::Transaction<'a>,
}

impl PgTransaction<'_> {
    /// Execute a batch of statements inside the transaction.
    pub async fn batch_execute(&self, sql: &str) -> PgResult<()> {
        debug!(bytes = sql.len(), "Executing batch in transaction");
        self.txn.batch_execute(sql).await?;
        Ok(())
    }

    /// Commit the transaction.
    pub async fn commit(self) -> PgResult<()> {
        debug!("Committing transaction");
        self.txn.commit().await?;
        Ok(())
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> PgResult<()> {
        debug!("Rolling back transaction");
        self.txn.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use rcgen::CertifiedKey;
    use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use strata_migrate::TransportSecurity;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_rustls::TlsAcceptor;

    fn localhost_cert() -> CertifiedKey {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap()
    }

    /// Serve one session: answer the SSLRequest with `S`, run the TLS
    /// handshake with `cert`, then hang up. Reports whether the handshake
    /// completed.
    async fn self_signed_server(cert: &CertifiedKey) -> (u16, oneshot::Receiver<bool>) {
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der()));
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let server = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.cert.der().clone()], key)
            .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(server));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut ssl_request = [0u8; 8];
            socket.read_exact(&mut ssl_request).await.unwrap();
            socket.write_all(b"S").await.unwrap();
            let _ = tx.send(acceptor.accept(socket).await.is_ok());
        });

        (port, rx)
    }

    fn local_config(port: u16, mode: TransportSecurity) -> PgConfig {
        PgConfig::from_url(format!("postgres://postgres:pw@localhost:{port}/postgres"))
            .unwrap()
            .with_ssl_mode(mode)
            .with_connect_timeout(Duration::from_secs(5))
    }

    async fn handshake_completed(rx: oneshot::Receiver<bool>) -> bool {
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_refused_is_protocol_error() {
        let config = PgConfig::from_url("postgres://postgres:pw@127.0.0.1:1/postgres")
            .unwrap()
            .with_ssl_mode(TransportSecurity::Disable)
            .with_connect_timeout(Duration::from_secs(2));

        let err = PgConnection::connect(&config).await.err().unwrap();
        assert!(err.is_protocol_error(), "{err}");
    }

    #[tokio::test]
    async fn test_prefer_and_require_accept_self_signed_certificate() {
        let cert = localhost_cert();

        for mode in [TransportSecurity::Prefer, TransportSecurity::Require] {
            let (port, handshake) = self_signed_server(&cert).await;

            // The server hangs up after the handshake, so the session
            // itself still fails, just not on the certificate.
            let err = PgConnection::connect(&local_config(port, mode))
                .await
                .err()
                .unwrap();

            assert!(handshake_completed(handshake).await, "{mode}: handshake failed");
            assert!(!err.to_string().contains("certificate"), "{mode}: {err}");
        }
    }

    #[tokio::test]
    async fn test_verify_full_rejects_unknown_issuer() {
        let cert = localhost_cert();
        let (port, handshake) = self_signed_server(&cert).await;

        let err = PgConnection::connect(&local_config(port, TransportSecurity::VerifyFull))
            .await
            .err()
            .unwrap();

        assert!(!handshake_completed(handshake).await);
        assert!(err.is_protocol_error());
        assert!(err.report().contains("certificate"), "{}", err.report());
    }

    #[tokio::test]
    async fn test_verify_full_trusts_root_cert() {
        let cert = localhost_cert();
        let mut root = tempfile::NamedTempFile::new().unwrap();
        root.write_all(cert.cert.pem().as_bytes()).unwrap();

        let (port, handshake) = self_signed_server(&cert).await;
        let config = local_config(port, TransportSecurity::VerifyFull).with_root_cert(root.path());
        let _ = PgConnection::connect(&config).await;

        assert!(handshake_completed(handshake).await);
    }
}
