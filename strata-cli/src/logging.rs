//! Logging setup for the `strata` binary.
//!
//! Logging is off unless asked for, so styled output is not interleaved
//! with log lines. Events go to stderr.
//!
//! # Environment Variables
//!
//! - `STRATA_DEBUG=true|1|yes` - Enable debug logging
//! - `STRATA_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `STRATA_LOG_FORMAT=json|pretty|compact` - Output format (default: compact)
//!
//! `-v`, `-vv` and `-vvv` select info, debug and trace when no variable is set.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Crates whose events are shown.
const TARGETS: &[&str] = &["strata_cli", "strata_migrate", "strata_postgres", "strata_rpc"];

/// Whether `STRATA_DEBUG` asks for debug logging.
pub fn is_debug_enabled() -> bool {
    env::var("STRATA_DEBUG")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: &str) -> Option<&'static str> {
    match value.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Pick the level from an explicit setting, the debug flag and `-v` count.
///
/// `None` means logging stays off.
pub fn select_level(level: Option<&str>, debug: bool, verbose: u8) -> Option<&'static str> {
    if let Some(level) = level.and_then(parse_level) {
        return Some(level);
    }
    if debug {
        return Some("debug");
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Output format from `STRATA_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("STRATA_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "json" => "json",
            "pretty" => "pretty",
            _ => "compact",
        })
        .unwrap_or("compact")
}

fn filter_for(level: &str) -> EnvFilter {
    let directives = TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the subscriber. Later calls are no-ops.
pub fn init(verbose: u8) {
    INIT.call_once(|| {
        let level_var = env::var("STRATA_LOG_LEVEL").ok();
        let Some(level) = select_level(level_var.as_deref(), is_debug_enabled(), verbose) else {
            return;
        };

        let filter = filter_for(level);
        let layer = fmt::layer().with_writer(std::io::stderr);

        match get_log_format() {
            "json" => tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init(),
            "pretty" => tracing_subscriber::registry()
                .with(filter)
                .with(layer.pretty())
                .init(),
            _ => tracing_subscriber::registry()
                .with(filter)
                .with(layer.compact())
                .init(),
        }

        tracing::debug!(level, format = get_log_format(), "Logging initialized");
    });
}
