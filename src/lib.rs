//! # Strata
//!
//! Ordered SQL script migrations for hosted PostgreSQL projects.
//!
//! Strata provides:
//! - Script sets loaded from a directory and applied in name order
//! - Connection descriptors derived from a project endpoint URL
//! - Two execution backends: helper-function calls through a PostgREST
//!   gateway, or direct PostgreSQL sessions
//! - A runner that halts at the first failed script
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scripts = ScriptSet::load(&ScriptSource::directory("./schema")).await?;
//!     let desc = ConnectionResolver::new().resolve("https://abcd.supabase.co", "secret")?;
//!     let backend = DirectBackend::from_descriptor(&desc);
//!
//!     let report = MigrationRunner::default()
//!         .run(RunContext::new(&scripts, &backend), &mut NoopObserver)
//!         .await;
//!
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Script sets, resolution, splitting and the runner.
pub mod migrate {
    pub use strata_migrate::*;
}

/// Direct PostgreSQL backend.
pub mod postgres {
    pub use strata_postgres::*;
}

/// PostgREST RPC backend.
pub mod rpc {
    pub use strata_rpc::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use strata_migrate::{
        ConnectionDescriptor, ConnectionResolver, ConnectivityProbe, ExecutionBackend,
        ExecutionResult, MigrationRunner, NoopObserver, ProbeResult, RunContext, RunReport,
        RunnerConfig, Script, ScriptSet, ScriptSource, SplitMode,
    };
    pub use strata_postgres::{DirectBackend, PgConfig, StatementMode};
    pub use strata_rpc::{PostgrestTransport, RpcBackend, RpcConfig};
}

// Re-export key types at the crate root
pub use strata_migrate::{MigrationError, MigrationRunner, ScriptSet};
