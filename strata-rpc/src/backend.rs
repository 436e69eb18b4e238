//! RPC execution backend.
//!
//! Scripts are sent whole to a helper function installed on the server. When
//! that call is rejected, the backend splits the script and calls the helper
//! once per statement. The fallback keeps going past failed statements; the
//! result reports the first failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_migrate::{
    ConnectivityProbe, ExecutionBackend, ExecutionResult, HelperProcedure,
    ProbeResult, Script, SplitMode, split_statements,
};
use strata_postgres::{DirectBackend, PgConfig};
use tracing::{debug, warn};

use crate::error::RpcResult;
use crate::transport::{PostgrestTransport, RpcTransport};

/// Settings for the remote helper function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Helper function name.
    pub function: String,
    /// Name of its single text argument.
    pub parameter: String,
    /// Splitter used by the fallback path.
    pub split_mode: SplitMode,
    /// Roles allowed to call the helper.
    pub grant_to: Vec<String>,
    /// Roles denied the helper, besides `PUBLIC`.
    pub revoke_from: Vec<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        let helper = HelperProcedure::default();
        Self {
            function: helper.name,
            parameter: helper.parameter,
            split_mode: SplitMode::Naive,
            grant_to: helper.grant_to,
            revoke_from: helper.revoke_from,
        }
    }
}

impl RpcConfig {
    /// The helper definition matching this configuration.
    pub fn helper(&self) -> HelperProcedure {
        HelperProcedure::new()
            .name(&self.function)
            .parameter(&self.parameter)
            .grant_to(self.grant_to.iter().cloned())
            .revoke_from(self.revoke_from.iter().cloned())
    }
}

/// Executes scripts through a gateway-exposed helper function.
#[derive(Debug)]
pub struct RpcBackend<T = PostgrestTransport> {
    transport: T,
    config: RpcConfig,
}

impl<T: RpcTransport> RpcBackend<T> {
    /// Create a backend over a transport.
    pub fn new(transport: T, config: RpcConfig) -> Self {
        Self { transport, config }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The helper configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    fn args(&self, sql: &str) -> Value {
        let mut args = Map::new();
        args.insert(self.config.parameter.clone(), Value::String(sql.to_string()));
        Value::Object(args)
    }

    async fn call(&self, sql: &str) -> RpcResult<Value> {
        self.transport.call(&self.config.function, &self.args(sql)).await
    }

    /// Call the helper once per statement, in order, without stopping.
    ///
    /// Returns the first error message, if any statement failed.
    async fn execute_split(&self, script: &Script) -> Option<String> {
        let statements = split_statements(&script.body, self.config.split_mode);
        let mut first_error = None;

        for (i, statement) in statements.iter().enumerate() {
            debug!(script = %script.name, statement = i + 1, of = statements.len(), "Calling helper for statement");
            if let Err(e) = self.call(statement).await {
                debug!(script = %script.name, statement = i + 1, error = %e, "Statement failed");
                first_error.get_or_insert_with(|| e.to_string());
            }
        }

        first_error
    }

    /// Install the helper function over a direct session.
    ///
    /// Best effort: the function may already exist, so any failure is
    /// logged and swallowed. Callers must not rely on this succeeding.
    /// Accepts a resolved [`ConnectionDescriptor`](strata_migrate::ConnectionDescriptor)
    /// or a [`PgConfig`].
    pub async fn ensure_helper_procedure(&self, target: impl Into<PgConfig>) {
        let helper = self.config.helper();
        let backend = DirectBackend::new(target.into());

        if let Err(e) = backend.install_helper(&helper).await {
            warn!(
                function = %helper.qualified_name(),
                error = %e,
                "Helper install failed, assuming it already exists"
            );
        }
    }
}

#[async_trait::async_trait]
impl<T: RpcTransport> ExecutionBackend for RpcBackend<T> {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn execute(&self, script: &Script) -> ExecutionResult {
        let primary = match self.call(&script.body).await {
            Ok(_) => return ExecutionResult::success(&script.name),
            Err(e) => e,
        };

        warn!(
            script = %script.name,
            error = %primary,
            "Whole-script call rejected, falling back to per-statement calls"
        );

        // With nothing to split, the rejected primary call is the only outcome.
        if split_statements(&script.body, self.config.split_mode).is_empty() {
            return ExecutionResult::failure(
                &script.name,
                format!("Error in {}: {}", script.name, primary),
            );
        }

        match self.execute_split(script).await {
            None => ExecutionResult::success(&script.name),
            Some(message) => {
                ExecutionResult::failure(&script.name, format!("Error in {}: {}", script.name, message))
            }
        }
    }
}

#[async_trait::async_trait]
impl<T: RpcTransport> ConnectivityProbe for RpcBackend<T> {
    async fn probe(&self) -> ProbeResult {
        match self.transport.ping().await {
            Ok(body) => ProbeResult::reachable(&body),
            Err(e) => ProbeResult::unreachable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use crate::error::RpcError;

    /// Records every call; rejects whole bodies containing `;` and any
    /// statement listed in `failing`.
    #[derive(Default)]
    struct FakeTransport {
        calls: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
        reject_multi: bool,
    }

    impl FakeTransport {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RpcTransport for FakeTransport {
        async fn call(&self, function: &str, args: &Value) -> RpcResult<Value> {
            assert_eq!(function, "sql");
            let sql = args["query"].as_str().unwrap().to_string();
            self.calls.lock().unwrap().push(sql.clone());

            if self.reject_multi && sql.contains(';') {
                return Err(RpcError::Api {
                    status: 404,
                    body: "function not found".to_string(),
                });
            }
            if self.failing.iter().any(|f| *f == sql) {
                return Err(RpcError::Api {
                    status: 400,
                    body: format!("bad statement {sql}"),
                });
            }
            Ok(Value::Null)
        }

        async fn ping(&self) -> RpcResult<String> {
            Ok("x".repeat(80))
        }
    }

    fn backend(transport: FakeTransport) -> RpcBackend<FakeTransport> {
        RpcBackend::new(transport, RpcConfig::default())
    }

    #[tokio::test]
    async fn test_primary_path_single_call() {
        let backend = backend(FakeTransport::default());
        let result = backend.execute(&Script::new("01.sql", "A; B")).await;

        assert!(result.is_success());
        assert_eq!(result.message, "01.sql executed successfully");
        assert_eq!(backend.transport().calls(), vec!["A; B"]);
    }

    #[tokio::test]
    async fn test_fallback_drops_empty_fragments() {
        let backend = backend(FakeTransport {
            reject_multi: true,
            ..Default::default()
        });
        let result = backend.execute(&Script::new("01.sql", "A; B;; C")).await;

        assert!(result.is_success());
        assert_eq!(backend.transport().calls(), vec!["A; B;; C", "A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_fallback_continues_and_reports_first_error() {
        let backend = backend(FakeTransport {
            reject_multi: true,
            failing: vec!["B", "C"],
            ..Default::default()
        });
        let result = backend.execute(&Script::new("02.sql", "A; B; C; D")).await;

        assert!(result.is_failure());
        assert_eq!(result.message, "Error in 02.sql: gateway error (400): bad statement B");
        assert_eq!(backend.transport().calls(), vec!["A; B; C; D", "A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_rejected_body_without_statements() {
        let backend = backend(FakeTransport {
            reject_multi: true,
            ..Default::default()
        });
        let result = backend.execute(&Script::new("03.sql", " ; ;")).await;

        assert!(result.is_failure());
        assert!(result.message.starts_with("Error in 03.sql: gateway error (404)"));
        assert_eq!(backend.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_aware_fallback_keeps_literals() {
        let config = RpcConfig {
            split_mode: SplitMode::Aware,
            ..Default::default()
        };
        let backend = RpcBackend::new(
            FakeTransport {
                reject_multi: true,
                failing: vec!["INSERT INTO t VALUES ('a;b')"],
                ..Default::default()
            },
            config,
        );
        let result = backend
            .execute(&Script::new("04.sql", "INSERT INTO t VALUES ('a;b'); SELECT 1"))
            .await;

        assert!(result.is_failure());
        assert_eq!(
            &backend.transport().calls()[1..],
            &["INSERT INTO t VALUES ('a;b')", "SELECT 1"]
        );
    }

    #[tokio::test]
    async fn test_probe_truncates_payload() {
        let result = backend(FakeTransport::default()).probe().await;
        assert!(result.ok);
        assert_eq!(result.detail.chars().count(), 50);
    }

    #[tokio::test]
    async fn test_probe_unreachable_gateway() {
        let transport =
            PostgrestTransport::new("http://127.0.0.1:1", "k", std::time::Duration::from_secs(2))
                .unwrap();
        let result = RpcBackend::new(transport, RpcConfig::default()).probe().await;

        assert!(!result.ok);
        assert!(!result.detail.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_helper_swallows_failure() {
        let desc = strata_migrate::ConnectionResolver::new()
            .base_domain("invalid")
            .connect_timeout(std::time::Duration::from_secs(1))
            .resolve("https://nowhere.invalid", "pw")
            .unwrap();

        backend(FakeTransport::default())
            .ensure_helper_procedure(&desc)
            .await;
    }

    #[test]
    fn test_config_helper() {
        let helper = RpcConfig::default().helper();
        assert_eq!(helper.qualified_name(), "\"public\".\"sql\"");
        assert_eq!(helper.grant_to, vec!["service_role".to_string()]);

        let config = RpcConfig {
            grant_to: vec!["deployer".to_string()],
            revoke_from: vec![],
            ..Default::default()
        };
        let sql = config.helper().create_sql();
        assert!(sql.contains("FROM PUBLIC;"));
        assert!(sql.contains("TO \"deployer\";"));
    }
}
