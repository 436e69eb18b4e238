//! Connection descriptor resolution.
//!
//! Turns a project endpoint reference such as `https://abcd1234.supabase.co`
//! plus a database secret into a full [`ConnectionDescriptor`]. Resolution is
//! a pure string transform: it never touches the network, so a wrong secret
//! is only discovered once a backend connects.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ResolutionError;

/// Default base domain of hosted projects.
pub const DEFAULT_BASE_DOMAIN: &str = "supabase.co";

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default database and user name.
pub const DEFAULT_DATABASE: &str = "postgres";

/// Transport security requirement for direct connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportSecurity {
    /// Plain TCP.
    Disable,
    /// TLS when the server offers it, without checking its certificate.
    Prefer,
    /// TLS or nothing, without checking the server certificate.
    #[default]
    Require,
    /// TLS with the certificate chain and host name verified.
    #[serde(rename = "verify-full")]
    VerifyFull,
}

impl TransportSecurity {
    /// The libpq `sslmode` spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyFull => "verify-full",
        }
    }

    /// Whether the server certificate is checked against trusted roots.
    pub fn verifies_certificate(&self) -> bool {
        matches!(self, Self::VerifyFull)
    }
}

impl fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to open a direct database session.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Transport security requirement.
    pub transport_security: TransportSecurity,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
}

impl ConnectionDescriptor {
    /// A `postgresql://` URL with the password masked, for display.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}?sslmode={}",
            self.user, self.host, self.port, self.database, self.transport_security
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("transport_security", &self.transport_security)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Derives connection descriptors from endpoint references.
#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    base_domain: String,
    port: u16,
    database: String,
    user: String,
    transport_security: TransportSecurity,
    connect_timeout: Duration,
}

impl Default for ConnectionResolver {
    fn default() -> Self {
        Self {
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_DATABASE.to_string(),
            transport_security: TransportSecurity::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionResolver {
    /// Create a resolver with the default base domain and names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base domain that project hosts live under.
    pub fn base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = domain.into().trim_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the database port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the login role.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the transport security requirement.
    pub fn transport_security(mut self, security: TransportSecurity) -> Self {
        self.transport_security = security;
        self
    }

    /// Set the connection timeout carried by resolved descriptors.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The configured base domain.
    pub fn domain(&self) -> &str {
        &self.base_domain
    }

    /// Extract the project identifier from an endpoint reference.
    ///
    /// The endpoint must be an `http(s)` URL whose host is exactly one label
    /// followed by the base domain, e.g. `https://proj123.supabase.co`.
    pub fn project_ref(&self, endpoint: &str) -> Result<String, ResolutionError> {
        let trimmed = endpoint.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError::malformed(endpoint, "endpoint is empty"));
        }

        let url = Url::parse(trimmed)
            .map_err(|e| ResolutionError::malformed(endpoint, e.to_string()))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ResolutionError::malformed(
                endpoint,
                format!("expected an http(s) URL, got scheme '{}'", url.scheme()),
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ResolutionError::malformed(endpoint, "missing host"))?
            .to_ascii_lowercase();

        let suffix = format!(".{}", self.base_domain);
        let project = host.strip_suffix(&suffix).ok_or_else(|| {
            ResolutionError::malformed(
                endpoint,
                format!("host '{}' is not under '{}'", host, self.base_domain),
            )
        })?;

        if project.is_empty() || project.contains('.') {
            return Err(ResolutionError::malformed(
                endpoint,
                format!("host '{}' does not name a single project", host),
            ));
        }

        Ok(project.to_string())
    }

    /// Resolve an endpoint reference and secret into a descriptor.
    pub fn resolve(
        &self,
        endpoint: &str,
        secret: &str,
    ) -> Result<ConnectionDescriptor, ResolutionError> {
        let project = self.project_ref(endpoint)?;

        Ok(ConnectionDescriptor {
            host: format!("db.{}.{}", project, self.base_domain),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: secret.to_string(),
            transport_security: self.transport_security,
            connect_timeout: self.connect_timeout,
        })
    }
}
