//! # strata-rpc
//!
//! RPC execution backend for strata.
//!
//! Scripts are applied by calling a helper SQL function through a
//! PostgREST-style gateway, so no database port needs to be reachable from
//! the caller. This crate provides:
//! - The [`RpcTransport`] seam and its [`PostgrestTransport`] implementation
//! - [`RpcBackend`], with the whole-script call and the per-statement fallback
//! - Best-effort installation of the helper function
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use strata_rpc::{PostgrestTransport, RpcBackend, RpcConfig};
//!
//! let transport = PostgrestTransport::new("https://abcd.supabase.co", api_key, Duration::from_secs(30))?;
//! let backend = RpcBackend::new(transport, RpcConfig::default());
//! ```

pub mod backend;
pub mod error;
pub mod transport;

pub use backend::{RpcBackend, RpcConfig};
pub use error::{RpcError, RpcResult};
pub use transport::{PostgrestTransport, RpcTransport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{RpcBackend, RpcConfig};
    pub use crate::error::{RpcError, RpcResult};
    pub use crate::transport::{PostgrestTransport, RpcTransport};
}
