//! `strata probe` - check that the selected backend answers.

use crate::commands::{Backend, Session};
use crate::error::{CliError, CliResult};
use crate::output;

/// Probe a backend and print the outcome.
pub async fn check(backend: &Backend) -> CliResult<()> {
    output::info(&format!("Probing {} backend...", backend.kind()));
    let result = backend.prober().probe().await;

    if !result.ok {
        return Err(CliError::Probe(result.detail));
    }

    output::reachable(&result);
    Ok(())
}

/// Run the probe command
pub async fn run(session: &Session) -> CliResult<()> {
    output::header("Probe");
    let backend = session.backend()?;
    check(&backend).await
}
