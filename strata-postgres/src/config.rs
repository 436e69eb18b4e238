//! PostgreSQL connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use strata_migrate::{ConnectionDescriptor, TransportSecurity};
use tokio_postgres::config::SslMode;

use crate::error::{PgError, PgResult};

/// Application name reported in `pg_stat_activity`.
pub const DEFAULT_APPLICATION_NAME: &str = "strata";

/// PostgreSQL connection configuration.
#[derive(Clone)]
pub struct PgConfig {
    /// Host.
    pub host: String,
    /// Port (default: 5432).
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: Option<String>,
    /// Transport security.
    pub ssl_mode: TransportSecurity,
    /// PEM bundle of trusted roots for `verify-full` (libpq `sslrootcert`).
    pub root_cert: Option<PathBuf>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Statement timeout applied to every session.
    pub statement_timeout: Option<Duration>,
    /// Application name (shown in pg_stat_activity).
    pub application_name: Option<String>,
}

impl std::fmt::Debug for PgConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ssl_mode", &self.ssl_mode)
            .field("root_cert", &self.root_cert)
            .field("connect_timeout", &self.connect_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .field("application_name", &self.application_name)
            .finish()
    }
}

impl From<&ConnectionDescriptor> for PgConfig {
    fn from(desc: &ConnectionDescriptor) -> Self {
        Self {
            host: desc.host.clone(),
            port: desc.port,
            database: desc.database.clone(),
            user: desc.user.clone(),
            password: Some(desc.password.clone()),
            ssl_mode: desc.transport_security,
            root_cert: None,
            connect_timeout: desc.connect_timeout,
            statement_timeout: None,
            application_name: Some(DEFAULT_APPLICATION_NAME.to_string()),
        }
    }
}

impl PgConfig {
    /// Create a configuration from a resolved descriptor.
    pub fn from_descriptor(desc: &ConnectionDescriptor) -> Self {
        Self::from(desc)
    }

    /// Create a new configuration from a database URL.
    pub fn from_url(url: impl AsRef<str>) -> PgResult<Self> {
        let parsed = url::Url::parse(url.as_ref())
            .map_err(|e| PgError::config(format!("invalid database URL: {}", e)))?;

        if parsed.scheme() != "postgresql" && parsed.scheme() != "postgres" {
            return Err(PgError::config(format!(
                "invalid scheme: expected 'postgresql' or 'postgres', got '{}'",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| PgError::config("missing host in URL"))?
            .to_string();

        let port = parsed.port().unwrap_or(5432);

        let database = match parsed.path().trim_start_matches('/') {
            "" => "postgres".to_string(),
            db => db.to_string(),
        };

        let user = if parsed.username().is_empty() {
            "postgres".to_string()
        } else {
            parsed.username().to_string()
        };

        let password = parsed.password().map(String::from);

        let mut ssl_mode = TransportSecurity::Prefer;
        let mut root_cert = None;
        let mut connect_timeout = Duration::from_secs(10);
        let mut statement_timeout = None;
        let mut application_name = Some(DEFAULT_APPLICATION_NAME.to_string());

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "sslmode" => {
                    ssl_mode = match value.as_ref() {
                        "disable" => TransportSecurity::Disable,
                        "prefer" => TransportSecurity::Prefer,
                        "require" => TransportSecurity::Require,
                        "verify-full" => TransportSecurity::VerifyFull,
                        other => {
                            return Err(PgError::config(format!("invalid sslmode: {}", other)));
                        }
                    };
                }
                "sslrootcert" => {
                    root_cert = Some(PathBuf::from(value.as_ref()));
                }
                "connect_timeout" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| PgError::config("invalid connect_timeout"))?;
                    connect_timeout = Duration::from_secs(secs);
                }
                "statement_timeout" => {
                    let ms: u64 = value
                        .parse()
                        .map_err(|_| PgError::config("invalid statement_timeout"))?;
                    statement_timeout = Some(Duration::from_millis(ms));
                }
                "application_name" => {
                    application_name = Some(value.into_owned());
                }
                _ => {}
            }
        }

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            ssl_mode,
            root_cert,
            connect_timeout,
            statement_timeout,
            application_name,
        })
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the statement timeout.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Set the transport security.
    pub fn with_ssl_mode(mut self, mode: TransportSecurity) -> Self {
        self.ssl_mode = mode;
        self
    }

    /// Set the trusted root bundle used by `verify-full`.
    pub fn with_root_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_cert = Some(path.into());
        self
    }

    /// `host:port/database` for logs.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Convert to tokio-postgres config.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.dbname(&self.database);
        config.user(&self.user);

        if let Some(ref password) = self.password {
            config.password(password);
        }

        if let Some(ref app_name) = self.application_name {
            config.application_name(app_name);
        }

        if let Some(timeout) = self.statement_timeout {
            config.options(&format!("-c statement_timeout={}", timeout.as_millis()));
        }

        // Certificate checks live in the rustls connector, not the driver.
        config.ssl_mode(match self.ssl_mode {
            TransportSecurity::Disable => SslMode::Disable,
            TransportSecurity::Prefer => SslMode::Prefer,
            TransportSecurity::Require | TransportSecurity::VerifyFull => SslMode::Require,
        });
        config.connect_timeout(self.connect_timeout);

        config
    }
}
