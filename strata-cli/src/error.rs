//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

use strata_migrate::{LoadError, MigrationError, ResolutionError};
use strata_postgres::PgError;
use strata_rpc::RpcError;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(strata::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(strata::config))]
    Config(String),

    /// A required credential or endpoint is missing
    #[error("Missing {what}: pass {flag} or set {env}")]
    #[diagnostic(code(strata::credentials))]
    Missing {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    /// Script loading error
    #[error("Load error: {0}")]
    #[diagnostic(code(strata::load))]
    Load(#[from] LoadError),

    /// Endpoint resolution error
    #[error("Resolution error: {0}")]
    #[diagnostic(code(strata::resolve))]
    Resolve(#[from] ResolutionError),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(strata::migration))]
    Migration(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(strata::database))]
    Database(#[from] PgError),

    /// Gateway error
    #[error("Gateway error: {0}")]
    #[diagnostic(code(strata::rpc))]
    Rpc(#[from] RpcError),

    /// Connectivity probe failed
    #[error("Probe failed: {0}")]
    #[diagnostic(code(strata::probe))]
    Probe(String),

    /// A run stopped on a failed script
    #[error("Run halted: {0}")]
    #[diagnostic(code(strata::halted))]
    Halted(String),
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Load(e) => CliError::Load(e),
            MigrationError::Resolution(e) => CliError::Resolve(e),
            other => CliError::Migration(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}
