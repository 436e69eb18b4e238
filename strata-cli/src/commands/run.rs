//! `strata run` - apply one script by name.

use strata_migrate::RunContext;

use crate::cli::RunArgs;
use crate::commands::Session;
use crate::commands::apply::ConsoleObserver;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the run command
pub async fn run(session: &Session, args: RunArgs) -> CliResult<()> {
    output::header("Run");

    let scripts = session.load_scripts().await?;
    let backend = session.backend()?;
    output::kv("Backend", &backend.kind().to_string());
    output::newline();

    let result = session
        .runner(None)
        .run_one(
            RunContext::new(&scripts, backend.executor()),
            &args.script,
            &mut ConsoleObserver,
        )
        .await?;

    output::newline();
    if result.is_failure() {
        return Err(CliError::Migration(result.message));
    }

    success(&result.message);
    Ok(())
}
