//! `strata apply` - apply every script in order.

use strata_migrate::{ProgressEvent, RunObserver, RunContext, Script};

use crate::cli::ApplyArgs;
use crate::commands::{Backend, Session, probe};
use crate::error::{CliError, CliResult};
use crate::output;

/// Renders `[i/N]` progress lines.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_script_start(&mut self, script: &Script, index: usize, total: usize) {
        output::script_started(script, index, total);
    }

    fn on_progress(&mut self, event: &ProgressEvent) {
        output::script_finished(&event.result);
    }
}

/// Run the apply command
pub async fn run(session: &Session, args: ApplyArgs) -> CliResult<()> {
    output::header("Apply");

    let scripts = session.load_scripts().await?;
    output::kv("Scripts", &session.scripts_dir().display().to_string());
    output::kv("Backend", &session.backend_kind().to_string());
    output::kv("Count", &scripts.len().to_string());
    output::newline();

    if scripts.is_empty() {
        output::warn(&format!(
            "No .{} scripts found in {}",
            session.config().scripts.extension,
            session.scripts_dir().display()
        ));
        return Ok(());
    }

    let backend = session.backend()?;

    if let Backend::Rpc(rpc) = &backend {
        if args.install_helper || session.config().rpc.install_helper {
            match session.pg_config() {
                Ok(target) => {
                    output::info("Installing helper function (best effort)...");
                    rpc.ensure_helper_procedure(target).await;
                }
                Err(e) => output::warn(&format!("Skipping helper install: {}", e)),
            }
        }
    }

    if args.probe {
        probe::check(&backend).await?;
        output::newline();
    }

    let runner = session.runner(args.pace_ms);
    let report = runner
        .run(RunContext::new(&scripts, backend.executor()), &mut ConsoleObserver)
        .await;

    output::newline();
    if report.is_halted() {
        return Err(CliError::Halted(report.summary()));
    }

    output::run_completed(&report);
    Ok(())
}
