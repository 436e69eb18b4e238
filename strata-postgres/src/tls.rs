//! TLS connector for direct sessions.
//!
//! `prefer` and `require` follow libpq: the session is encrypted but the
//! server certificate is not checked, since hosted projects present
//! certificates issued by the provider's own CA. `verify-full` checks the
//! chain and host name against `root_cert` when one is configured, else
//! against the bundled web PKI roots.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};

/// Build the rustls connector for a session.
///
/// The connector is also handed to sessions with `sslmode=disable`; the
/// driver simply never negotiates TLS for them.
pub fn make_connector(config: &PgConfig) -> PgResult<MakeRustlsConnect> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| PgError::tls(e.to_string()))?;

    let tls = if config.ssl_mode.verifies_certificate() {
        builder
            .with_root_certificates(trusted_roots(config.root_cert.as_deref())?)
            .with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(EncryptOnly { provider }))
            .with_no_client_auth()
    };

    Ok(MakeRustlsConnect::new(tls))
}

/// Roots for `verify-full`: the PEM bundle at `root_cert`, or web PKI.
fn trusted_roots(root_cert: Option<&Path>) -> PgResult<RootCertStore> {
    let mut roots = RootCertStore::empty();

    let Some(path) = root_cert else {
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        return Ok(roots);
    };

    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| PgError::tls(format!("cannot read {}: {}", path.display(), e)))?;
    for cert in certs {
        let cert = cert.map_err(|e| PgError::tls(format!("bad PEM in {}: {}", path.display(), e)))?;
        roots
            .add(cert)
            .map_err(|e| PgError::tls(format!("bad certificate in {}: {}", path.display(), e)))?;
    }

    if roots.is_empty() {
        return Err(PgError::tls(format!("no certificates in {}", path.display())));
    }
    Ok(roots)
}

/// Accepts any server certificate. Handshake signatures are still checked.
#[derive(Debug)]
struct EncryptOnly {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for EncryptOnly {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use strata_migrate::TransportSecurity;

    fn config(mode: TransportSecurity) -> PgConfig {
        PgConfig::from_url("postgres://localhost/postgres")
            .unwrap()
            .with_ssl_mode(mode)
    }

    #[test]
    fn test_connector_builds_for_every_mode() {
        for mode in [
            TransportSecurity::Disable,
            TransportSecurity::Prefer,
            TransportSecurity::Require,
            TransportSecurity::VerifyFull,
        ] {
            assert!(make_connector(&config(mode)).is_ok(), "{mode}");
        }
    }

    #[test]
    fn test_missing_root_cert_is_tls_error() {
        let config = config(TransportSecurity::VerifyFull).with_root_cert("/nonexistent/root.crt");
        let err = make_connector(&config).err().unwrap();
        assert!(matches!(err, PgError::Tls(_)));
        assert!(err.report().starts_with("Error: tls error: cannot read /nonexistent/root.crt"));
    }

    #[test]
    fn test_root_cert_without_certificates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();

        let config = config(TransportSecurity::VerifyFull).with_root_cert(file.path());
        let err = make_connector(&config).err().unwrap();
        assert!(err.to_string().contains("no certificates in"));
    }

    #[test]
    fn test_root_cert_ignored_without_verification() {
        let config = config(TransportSecurity::Require).with_root_cert("/nonexistent/root.crt");
        assert!(make_connector(&config).is_ok());
    }
}
