//! `strata list` - show the script set.

use crate::cli::ListArgs;
use crate::commands::Session;
use crate::error::CliResult;
use crate::output;

/// Run the list command
pub async fn run(session: &Session, args: ListArgs) -> CliResult<()> {
    output::header("Scripts");

    let scripts = session.load_scripts().await?;
    output::kv("Directory", &session.scripts_dir().display().to_string());
    output::kv("Count", &scripts.len().to_string());
    output::newline();

    if scripts.is_empty() {
        output::warn(&format!(
            "No .{} scripts found",
            session.config().scripts.extension
        ));
        return Ok(());
    }

    for script in &scripts {
        output::script_entry(script);
        if args.preview {
            output::code(&script.preview(args.limit));
        }
    }

    Ok(())
}
