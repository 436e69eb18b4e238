//! # strata-postgres
//!
//! Direct PostgreSQL wire-protocol backend for strata.
//!
//! This crate provides:
//! - [`PgConfig`] built from a resolved descriptor or a `postgres://` URL
//! - Scoped sessions with rustls transport security
//! - [`DirectBackend`], applying each script inside its own transaction
//! - Installation of the helper function the RPC backend calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_migrate::{ConnectionResolver, ExecutionBackend, Script};
//! use strata_postgres::DirectBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let desc = ConnectionResolver::new().resolve("https://abcd.supabase.co", "secret")?;
//!     let backend = DirectBackend::from_descriptor(&desc);
//!
//!     let result = backend.execute(&Script::new("001.sql", "SELECT 1")).await;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod connection;
pub mod error;
pub mod tls;

pub use backend::{DirectBackend, PROBE_SQL, StatementMode};
pub use config::PgConfig;
pub use connection::{PgConnection, PgTransaction};
pub use error::{PgError, PgResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{DirectBackend, StatementMode};
    pub use crate::config::PgConfig;
    pub use crate::error::{PgError, PgResult};
}
