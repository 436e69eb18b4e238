//! CLI configuration handling.
//!
//! Settings live in `strata.toml`. Every section and field is optional; a
//! missing file means all defaults. Secrets never go in this file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use strata_migrate::{ConnectionResolver, SplitMode, TransportSecurity};
use strata_postgres::StatementMode;
use strata_rpc::RpcConfig;

use crate::error::CliResult;

/// Default config file name (lives in the working directory)
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Which backend applies scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Helper function called through the PostgREST gateway
    #[default]
    Rpc,
    /// Direct PostgreSQL session
    Direct,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Rpc => write!(f, "rpc"),
            BackendKind::Direct => write!(f, "direct"),
        }
    }
}

/// Strata CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target project and session settings
    pub connection: ConnectionConfig,

    /// Script discovery
    pub scripts: ScriptsConfig,

    /// RPC backend settings
    pub rpc: RpcSection,

    /// Direct backend settings
    pub direct: DirectSection,

    /// Runner settings
    pub run: RunSection,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> CliResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Project endpoint URL
    pub endpoint: Option<String>,

    /// Domain that project hosts live under
    pub base_domain: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Login role
    pub user: String,

    /// Transport security for direct sessions
    pub transport: TransportSecurity,

    /// PEM bundle of trusted roots, used with `transport = "verify-full"`
    pub root_cert: Option<PathBuf>,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Backend used to apply scripts
    pub backend: BackendKind,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            base_domain: "supabase.co".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            transport: TransportSecurity::Require,
            root_cert: None,
            connect_timeout_secs: 10,
            backend: BackendKind::Rpc,
        }
    }
}

impl ConnectionConfig {
    /// Resolver configured from this section
    pub fn resolver(&self) -> ConnectionResolver {
        ConnectionResolver::new()
            .base_domain(&self.base_domain)
            .port(self.port)
            .database(&self.database)
            .user(&self.user)
            .transport_security(self.transport)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Script discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Directory holding the scripts
    pub directory: PathBuf,

    /// File extension, without the dot
    pub extension: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            extension: "sql".to_string(),
        }
    }
}

/// RPC backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSection {
    /// Helper function name
    pub function: String,

    /// Helper argument name
    pub parameter: String,

    /// Splitter for the per-statement fallback
    pub split_mode: SplitMode,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Install the helper before `apply`
    pub install_helper: bool,

    /// Roles granted EXECUTE on the helper
    pub grant_to: Vec<String>,

    /// Roles denied the helper, besides PUBLIC
    pub revoke_from: Vec<String>,
}

impl Default for RpcSection {
    fn default() -> Self {
        let rpc = RpcConfig::default();
        Self {
            function: rpc.function,
            parameter: rpc.parameter,
            split_mode: rpc.split_mode,
            timeout_secs: 30,
            install_helper: false,
            grant_to: rpc.grant_to,
            revoke_from: rpc.revoke_from,
        }
    }
}

impl RpcSection {
    /// Backend settings for this section
    pub fn backend_config(&self) -> RpcConfig {
        RpcConfig {
            function: self.function.clone(),
            parameter: self.parameter.clone(),
            split_mode: self.split_mode,
            grant_to: self.grant_to.clone(),
            revoke_from: self.revoke_from.clone(),
        }
    }
}

/// Direct backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectSection {
    /// Whole body per round trip, or one statement at a time
    pub statement_mode: StatementMode,

    /// Splitter used in per-statement mode
    pub split_mode: SplitMode,
}

/// Runner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Delay between scripts in milliseconds
    pub pace_ms: u64,
}
