//! Error types for PostgreSQL operations.

use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// Error reported by the driver or the server.
    #[error("{}", describe(.0))]
    Postgres(#[from] tokio_postgres::Error),

    /// TLS setup error.
    #[error("tls error: {0}")]
    Tls(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error outside the driver.
    #[error("connection error: {0}")]
    Connection(String),

    /// Timeout error.
    #[error("operation timed out after {0}ms")]
    Timeout(u64),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Whether this error came from the wire protocol driver.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    /// Whether the server itself rejected a statement.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Postgres(e) if e.as_db_error().is_some())
    }

    /// SQLSTATE code, when the server reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|c| c.code()),
            _ => None,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Operator-facing message, prefixed by error category.
    pub fn report(&self) -> String {
        if self.is_protocol_error() {
            format!("PostgreSQL Error: {}", self)
        } else {
            format!("Error: {}", self)
        }
    }
}

/// Render a driver error with the server's message, detail and hint.
///
/// The driver's own `Display` for server errors is just "db error", which
/// tells an operator nothing.
fn describe(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut out = format!("{}: {} ({})", db.severity(), db.message(), db.code().code());
            if let Some(detail) = db.detail() {
                out.push_str(&format!("; detail: {}", detail));
            }
            if let Some(hint) = db.hint() {
                out.push_str(&format!("; hint: {}", hint));
            }
            out
        }
        None => {
            let mut out = err.to_string();
            let mut source = std::error::Error::source(err);
            while let Some(cause) = source {
                out.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));
        assert!(!err.is_protocol_error());

        let err = PgError::Timeout(5000);
        assert!(err.is_timeout());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_report_prefix_for_non_protocol_errors() {
        let err = PgError::tls("no root certificates");
        assert_eq!(err.report(), "Error: tls error: no root certificates");

        let err = PgError::Timeout(250);
        assert!(err.report().starts_with("Error: "));
    }
}
