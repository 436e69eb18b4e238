//! `strata helper` - the SQL function the RPC backend calls.

use strata_postgres::DirectBackend;

use crate::commands::Session;
use crate::error::CliResult;
use crate::output::{self, kv, success};

/// Install the helper over a direct session.
///
/// A failure is reported as a warning; the function may already exist.
pub async fn install(session: &Session) -> CliResult<()> {
    output::header("Helper Install");

    let helper = session.config().rpc.backend_config().helper();
    let target = session.pg_config()?;
    kv("Function", &helper.qualified_name());
    kv("Callers", &helper.grant_to.join(", "));
    kv("Target", &target.target());
    output::newline();

    match DirectBackend::new(target).install_helper(&helper).await {
        Ok(()) => success("Helper function installed"),
        Err(e) => output::warn(&format!(
            "Helper install failed, it may already exist: {}",
            e.report()
        )),
    }

    Ok(())
}

/// Print the helper definition.
pub async fn show(session: &Session) -> CliResult<()> {
    let helper = session.config().rpc.backend_config().helper();
    output::section(&helper.qualified_name());
    output::code(&helper.create_sql());
    output::dim(helper.reload_sql());
    Ok(())
}
