//! # strata-migrate
//!
//! Migration orchestration core for strata.
//!
//! This crate provides:
//! - Script set loading from a directory or an in-memory table
//! - Connection descriptor resolution from a project endpoint reference
//! - Statement splitting (naive, or quote/comment aware)
//! - The [`ExecutionBackend`] and [`ConnectivityProbe`] seams
//! - The [`MigrationRunner`] with halt-on-first-failure semantics
//!
//! It performs no network I/O itself; the wire-protocol and RPC backends
//! live in `strata-postgres` and `strata-rpc`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ Endpoint +   │────▶│ Connection     │────▶│ ExecutionBackend │
//! │ secret       │     │ Resolver       │     │ (rpc | direct)   │
//! └──────────────┘     └────────────────┘     └──────────────────┘
//!                                                      │
//! ┌──────────────┐     ┌────────────────┐              │
//! │ ScriptSource │────▶│ ScriptSet      │──────┐       │
//! └──────────────┘     └────────────────┘      ▼       ▼
//!                                          ┌──────────────────┐
//!                                          │ MigrationRunner  │──▶ results
//!                                          └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_migrate::{
//!     ConnectionResolver, MigrationRunner, NoopObserver, RunContext, ScriptSet, ScriptSource,
//! };
//!
//! async fn apply(backend: &dyn strata_migrate::ExecutionBackend) -> Result<(), Box<dyn std::error::Error>> {
//!     let scripts = ScriptSet::load(&ScriptSource::directory("./schema")).await?;
//!
//!     let report = MigrationRunner::default()
//!         .run(RunContext::new(&scripts, backend), &mut NoopObserver)
//!         .await;
//!
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod helper;
pub mod probe;
pub mod resolve;
pub mod runner;
pub mod script;
pub mod split;

// Re-exports
pub use backend::{ExecutionBackend, ExecutionOutcome, ExecutionResult};
pub use error::{LoadError, MigrateResult, MigrationError, ResolutionError};
pub use helper::HelperProcedure;
pub use probe::{ConnectivityProbe, ProbeResult};
pub use resolve::{ConnectionDescriptor, ConnectionResolver, TransportSecurity};
pub use runner::{
    MigrationRunner, NoopObserver, ProgressEvent, RunContext, RunObserver, RunPhase, RunReport,
    RunState, RunnerConfig,
};
pub use script::{Script, ScriptSet, ScriptSource};
pub use split::{SplitMode, split_statements};
