//! Global flags merged over the config file, and backend construction.

use std::path::PathBuf;
use std::time::Duration;

use strata_migrate::{
    ConnectionDescriptor, ConnectionResolver, ConnectivityProbe, ExecutionBackend,
    MigrationRunner, RunnerConfig, ScriptSet, ScriptSource,
};
use strata_postgres::{DirectBackend, PgConfig};
use strata_rpc::{PostgrestTransport, RpcBackend};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::config::{BackendKind, Config};
use crate::error::{CliError, CliResult};

/// The backend selected once at startup.
pub enum Backend {
    /// PostgREST helper function calls.
    Rpc(RpcBackend),
    /// Direct PostgreSQL sessions.
    Direct(DirectBackend),
}

impl Backend {
    /// Which kind this is.
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Rpc(_) => BackendKind::Rpc,
            Backend::Direct(_) => BackendKind::Direct,
        }
    }

    /// The backend as an executor.
    pub fn executor(&self) -> &dyn ExecutionBackend {
        match self {
            Backend::Rpc(b) => b,
            Backend::Direct(b) => b,
        }
    }

    /// The backend as a probe.
    pub fn prober(&self) -> &dyn ConnectivityProbe {
        match self {
            Backend::Rpc(b) => b,
            Backend::Direct(b) => b,
        }
    }
}

/// Everything a command needs to know about the invocation.
#[derive(Clone)]
pub struct Session {
    global: GlobalArgs,
    config: Config,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl Session {
    /// Load the config file named by the global flags.
    pub fn new(global: GlobalArgs) -> CliResult<Self> {
        let config = Config::load_or_default(&global.config)?;
        debug!(path = %global.config.display(), "Configuration loaded");
        Ok(Self { global, config })
    }

    /// Build a session from already-loaded parts.
    pub fn from_parts(global: GlobalArgs, config: Config) -> Self {
        Self { global, config }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backend selected by flag, else by config.
    pub fn backend_kind(&self) -> BackendKind {
        self.global.backend.unwrap_or(self.config.connection.backend)
    }

    /// Script directory selected by flag, else by config.
    pub fn scripts_dir(&self) -> PathBuf {
        self.global
            .scripts
            .clone()
            .unwrap_or_else(|| self.config.scripts.directory.clone())
    }

    /// Where scripts are loaded from.
    pub fn script_source(&self) -> ScriptSource {
        ScriptSource::directory(self.scripts_dir()).with_extension(&self.config.scripts.extension)
    }

    /// Load the script set.
    pub async fn load_scripts(&self) -> CliResult<ScriptSet> {
        Ok(ScriptSet::load(&self.script_source()).await?)
    }

    /// Project endpoint.
    pub fn endpoint(&self) -> CliResult<&str> {
        non_empty(self.global.endpoint.as_deref())
            .or_else(|| non_empty(self.config.connection.endpoint.as_deref()))
            .ok_or(CliError::Missing {
                what: "endpoint",
                flag: "--endpoint",
                env: "STRATA_ENDPOINT",
            })
    }

    /// Database password, when given.
    pub fn db_password(&self) -> Option<&str> {
        non_empty(self.global.db_password.as_deref())
    }

    /// Resolver configured from the `[connection]` section.
    pub fn resolver(&self) -> ConnectionResolver {
        self.config.connection.resolver()
    }

    /// Descriptor derived from the endpoint and database password.
    pub fn descriptor(&self) -> CliResult<ConnectionDescriptor> {
        let endpoint = self.endpoint()?;
        let password = self.db_password().ok_or(CliError::Missing {
            what: "database password",
            flag: "--db-password",
            env: "STRATA_DB_PASSWORD",
        })?;
        Ok(self.resolver().resolve(endpoint, password)?)
    }

    /// Direct session settings: `--database-url` if given, else resolved.
    pub fn pg_config(&self) -> CliResult<PgConfig> {
        let config = match non_empty(self.global.database_url.as_deref()) {
            Some(url) => PgConfig::from_url(url)?,
            None => PgConfig::from_descriptor(&self.descriptor()?),
        };

        // `sslrootcert` in the URL wins over the config file.
        match (&config.root_cert, &self.config.connection.root_cert) {
            (None, Some(path)) => Ok(config.with_root_cert(path)),
            _ => Ok(config),
        }
    }

    /// RPC backend over the project gateway.
    pub fn rpc_backend(&self) -> CliResult<RpcBackend> {
        let endpoint = self.endpoint()?;
        let api_key = non_empty(self.global.api_key.as_deref()).ok_or(CliError::Missing {
            what: "API key",
            flag: "--api-key",
            env: "STRATA_API_KEY",
        })?;

        let rpc = &self.config.rpc;
        let transport =
            PostgrestTransport::new(endpoint, api_key, Duration::from_secs(rpc.timeout_secs))?;
        Ok(RpcBackend::new(transport, rpc.backend_config()))
    }

    /// Direct backend.
    pub fn direct_backend(&self) -> CliResult<DirectBackend> {
        let direct = &self.config.direct;
        Ok(DirectBackend::new(self.pg_config()?)
            .statement_mode(direct.statement_mode)
            .split_mode(direct.split_mode))
    }

    /// The selected backend.
    pub fn backend(&self) -> CliResult<Backend> {
        match self.backend_kind() {
            BackendKind::Rpc => Ok(Backend::Rpc(self.rpc_backend()?)),
            BackendKind::Direct => Ok(Backend::Direct(self.direct_backend()?)),
        }
    }

    /// Runner with pacing from the override, else from config.
    pub fn runner(&self, pace_ms: Option<u64>) -> MigrationRunner {
        let pace = Duration::from_millis(pace_ms.unwrap_or(self.config.run.pace_ms));
        MigrationRunner::new(RunnerConfig::new().pace(pace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_migrate::TransportSecurity;

    fn global() -> GlobalArgs {
        GlobalArgs {
            endpoint: Some("https://abcd.supabase.co".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.connection.backend = BackendKind::Direct;
        config.scripts.directory = PathBuf::from("db");

        let session = Session::from_parts(global(), config.clone());
        assert_eq!(session.backend_kind(), BackendKind::Direct);
        assert_eq!(session.scripts_dir(), PathBuf::from("db"));

        let session = Session::from_parts(
            GlobalArgs {
                backend: Some(BackendKind::Rpc),
                scripts: Some(PathBuf::from("other")),
                ..global()
            },
            config,
        );
        assert_eq!(session.backend_kind(), BackendKind::Rpc);
        assert_eq!(session.scripts_dir(), PathBuf::from("other"));
    }

    #[test]
    fn test_missing_credentials() {
        let session = Session::from_parts(global(), Config::default());
        assert!(matches!(
            session.rpc_backend(),
            Err(CliError::Missing { flag: "--api-key", .. })
        ));
        assert!(matches!(
            session.descriptor(),
            Err(CliError::Missing { flag: "--db-password", .. })
        ));

        let session = Session::from_parts(GlobalArgs::default(), Config::default());
        assert!(matches!(
            session.endpoint(),
            Err(CliError::Missing { flag: "--endpoint", .. })
        ));
    }

    #[test]
    fn test_pg_config_sources() {
        let session = Session::from_parts(
            GlobalArgs {
                db_password: Some("pw".to_string()),
                ..global()
            },
            Config::default(),
        );
        assert_eq!(session.pg_config().unwrap().host, "db.abcd.supabase.co");

        let session = Session::from_parts(
            GlobalArgs {
                database_url: Some("postgres://u:p@localhost:6000/app".to_string()),
                ..GlobalArgs::default()
            },
            Config::default(),
        );
        let config = session.pg_config().unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 6000);
    }

    #[test]
    fn test_pg_config_root_cert() {
        let mut config = Config::default();
        config.connection.transport = TransportSecurity::VerifyFull;
        config.connection.root_cert = Some(PathBuf::from("ca.crt"));

        let session = Session::from_parts(
            GlobalArgs {
                db_password: Some("pw".to_string()),
                ..global()
            },
            config.clone(),
        );
        let pg = session.pg_config().unwrap();
        assert_eq!(pg.ssl_mode, TransportSecurity::VerifyFull);
        assert_eq!(pg.root_cert, Some(PathBuf::from("ca.crt")));

        let session = Session::from_parts(
            GlobalArgs {
                database_url: Some(
                    "postgres://u:p@localhost/app?sslmode=verify-full&sslrootcert=url.crt"
                        .to_string(),
                ),
                ..GlobalArgs::default()
            },
            config,
        );
        assert_eq!(session.pg_config().unwrap().root_cert, Some(PathBuf::from("url.crt")));
    }

    #[test]
    fn test_backend_selection() {
        let session = Session::from_parts(
            GlobalArgs {
                api_key: Some("key".to_string()),
                ..global()
            },
            Config::default(),
        );
        let backend = session.backend().unwrap();
        assert_eq!(backend.kind(), BackendKind::Rpc);
        assert_eq!(backend.executor().name(), "rpc");
    }

    #[test]
    fn test_runner_pace() {
        let mut config = Config::default();
        config.run.pace_ms = 500;
        let session = Session::from_parts(global(), config);

        assert_eq!(session.runner(None).config().pace, Duration::from_millis(500));
        assert_eq!(session.runner(Some(0)).config().pace, Duration::ZERO);
    }
}
