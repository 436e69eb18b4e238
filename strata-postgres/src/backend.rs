//! Direct wire-protocol backend.

use serde::{Deserialize, Serialize};
use strata_migrate::{
    ConnectionDescriptor, ConnectivityProbe, ExecutionBackend, ExecutionResult, HelperProcedure,
    ProbeResult, Script, SplitMode, split_statements,
};
use tracing::{debug, info};

use crate::config::PgConfig;
use crate::connection::PgConnection;
use crate::error::PgResult;

/// Query used by the connectivity probe.
pub const PROBE_SQL: &str = "SELECT version()";

/// How a script body is sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementMode {
    /// The whole body in one simple-query round trip.
    #[default]
    Batch,
    /// One round trip per statement, stopping at the first rejected one.
    PerStatement,
}

/// Applies scripts over a fresh PostgreSQL session per script.
///
/// Each script runs inside one transaction which is committed on success.
/// Any error rolls the transaction back and closes the session.
#[derive(Debug, Clone)]
pub struct DirectBackend {
    config: PgConfig,
    statement_mode: StatementMode,
    split_mode: SplitMode,
}

impl DirectBackend {
    /// Create a backend for a connection configuration.
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            statement_mode: StatementMode::default(),
            split_mode: SplitMode::default(),
        }
    }

    /// Create a backend for a resolved descriptor.
    pub fn from_descriptor(desc: &ConnectionDescriptor) -> Self {
        Self::new(PgConfig::from_descriptor(desc))
    }

    /// Set the statement mode.
    pub fn statement_mode(mut self, mode: StatementMode) -> Self {
        self.statement_mode = mode;
        self
    }

    /// Set the splitter used in [`StatementMode::PerStatement`].
    pub fn split_mode(mut self, mode: SplitMode) -> Self {
        self.split_mode = mode;
        self
    }

    /// The connection configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Apply one script body. Returns the number of round trips made.
    pub async fn apply(&self, body: &str) -> PgResult<usize> {
        let mut conn = PgConnection::connect(&self.config).await?;
        let txn = conn.transaction().await?;

        let round_trips = match self.statement_mode {
            StatementMode::Batch => {
                txn.batch_execute(body).await?;
                1
            }
            StatementMode::PerStatement => {
                let statements = split_statements(body, self.split_mode);
                for (i, statement) in statements.iter().enumerate() {
                    debug!(statement = i + 1, of = statements.len(), "Executing statement");
                    txn.batch_execute(statement).await?;
                }
                statements.len()
            }
        };

        txn.commit().await?;
        Ok(round_trips)
    }

    /// Install the helper function used by the RPC backend.
    pub async fn install_helper(&self, helper: &HelperProcedure) -> PgResult<()> {
        let conn = PgConnection::connect(&self.config).await?;
        conn.batch_execute(&helper.create_sql()).await?;
        conn.batch_execute(helper.reload_sql()).await?;
        info!(function = %helper.qualified_name(), target = %conn.target(), "Helper function installed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExecutionBackend for DirectBackend {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn execute(&self, script: &Script) -> ExecutionResult {
        match self.apply(&script.body).await {
            Ok(round_trips) => {
                debug!(script = %script.name, round_trips, "Script committed");
                ExecutionResult::success(&script.name)
            }
            Err(e) => ExecutionResult::failure(&script.name, e.report()),
        }
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for DirectBackend {
    async fn probe(&self) -> ProbeResult {
        let result = async {
            let conn = PgConnection::connect(&self.config).await?;
            conn.query_scalar_text(PROBE_SQL).await
        }
        .await;

        match result {
            Ok(version) => ProbeResult::reachable(&version),
            Err(e) => ProbeResult::unreachable(e.report()),
        }
    }
}
