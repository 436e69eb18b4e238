//! `strata version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::logo();
    output::newline();

    kv("Version", VERSION);
    kv("Binary", "strata");

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);
    kv("Backends", "rpc, direct");

    output::newline();
    output::section("Components");
    kv("strata-migrate", VERSION);
    kv("strata-postgres", VERSION);
    kv("strata-rpc", VERSION);

    Ok(())
}
