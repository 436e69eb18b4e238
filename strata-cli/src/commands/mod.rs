//! CLI command implementations.
//!
//! Every command except `version` works from a [`Session`]: the parsed
//! global flags merged over `strata.toml`.

pub mod apply;
pub mod helper;
pub mod list;
pub mod probe;
pub mod resolve;
pub mod run;
pub mod version;

mod session;

pub use session::{Backend, Session};
