//! `strata resolve` - show the descriptor derived from the endpoint.

use crate::commands::Session;
use crate::error::CliResult;
use crate::output::{self, kv};

/// Run the resolve command
pub async fn run(session: &Session) -> CliResult<()> {
    output::header("Resolve");

    let endpoint = session.endpoint()?;
    let resolver = session.resolver();
    let project = resolver.project_ref(endpoint)?;
    let desc = resolver.resolve(endpoint, session.db_password().unwrap_or_default())?;

    kv("Endpoint", endpoint);
    kv("Project", &project);
    kv("Host", &desc.host);
    kv("Port", &desc.port.to_string());
    kv("Database", &desc.database);
    kv("User", &desc.user);
    kv("Transport", desc.transport_security.as_str());
    kv("Timeout", &format!("{}s", desc.connect_timeout.as_secs()));
    kv("URL", &desc.redacted_url());

    if session.db_password().is_none() {
        output::newline();
        output::dim("No database password given (--db-password or STRATA_DB_PASSWORD)");
    }

    Ok(())
}
