//! CLI argument definitions using clap.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BackendKind, CONFIG_FILE_NAME};

/// Strata - ordered SQL script migrations for hosted PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Strata - ordered SQL script migrations for hosted PostgreSQL", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
///
/// Secrets are only ever taken from flags or the environment, never from
/// the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to the config file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Execution backend (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory holding the SQL scripts (overrides the config file)
    #[arg(long, global = true)]
    pub scripts: Option<PathBuf>,

    /// Project endpoint URL, e.g. https://abcd.supabase.co
    #[arg(long, global = true, env = "STRATA_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Service role key for the RPC gateway. The helper function is not
    /// callable with the anon key.
    #[arg(long, global = true, env = "STRATA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Database password for direct sessions
    #[arg(long, global = true, env = "STRATA_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Full postgres:// URL, bypassing endpoint resolution
    #[arg(long, global = true, env = "STRATA_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every script in order, halting at the first failure
    Apply(ApplyArgs),

    /// Apply a single script by name
    Run(RunArgs),

    /// List the scripts that would be applied
    List(ListArgs),

    /// Check that the selected backend is reachable
    Probe,

    /// Print the connection descriptor derived from the endpoint
    Resolve,

    /// Helper function management
    Helper(HelperArgs),

    /// Display version information
    Version,
}

/// Arguments for the `apply` command
#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    /// Probe the backend before applying anything
    #[arg(long)]
    pub probe: bool,

    /// Install the RPC helper function first (best effort)
    #[arg(long)]
    pub install_helper: bool,

    /// Milliseconds to wait between scripts (overrides the config file)
    #[arg(long)]
    pub pace_ms: Option<u64>,
}

/// Arguments for the `run` command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script file name, e.g. 02_create_tables.sql
    pub script: String,
}

/// Arguments for the `list` command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show the start of each script body
    #[arg(short, long)]
    pub preview: bool,

    /// Preview length in characters
    #[arg(long, default_value_t = 500)]
    pub limit: usize,
}

/// Arguments for the `helper` command
#[derive(Args, Debug)]
pub struct HelperArgs {
    #[command(subcommand)]
    pub command: HelperSubcommand,
}

/// Helper subcommands
#[derive(Subcommand, Debug)]
pub enum HelperSubcommand {
    /// Install the helper function over a direct session (best effort)
    Install,

    /// Print the helper function definition
    Show,
}
