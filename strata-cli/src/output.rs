//! Terminal rendering for scripts, results and reports.
//!
//! Line layout lives in the plain `*_line` functions so it can be tested
//! without color codes; the printing functions only add styling.

use owo_colors::OwoColorize;
use strata_migrate::{ExecutionResult, ProbeResult, RunReport, Script};

/// Checksum characters shown per script.
const CHECKSUM_PREFIX: usize = 12;

/// Indent of a result line under its progress line.
const RESULT_INDENT: &str = "      ";

/// `[ 3/12]`, with the position padded to the width of the total so
/// progress lines stay aligned.
pub fn progress_label(position: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{:>width$}/{}]", position, total, width = width)
}

/// `name (N bytes, sha256 abcdef012345)`
pub fn script_line(script: &Script) -> String {
    let checksum = script.checksum();
    format!(
        "{} ({} bytes, sha256 {})",
        script.name,
        script.len(),
        &checksum[..CHECKSUM_PREFIX]
    )
}

/// Title of a command's output.
pub fn header(title: &str) {
    println!();
    println!("{} {}", "▍".cyan(), title.bold());
    println!();
}

/// The Strata logo
pub fn logo() {
    let logo = r#"
    ┌─┐┌┬┐┬─┐┌─┐┌┬┐┌─┐
    └─┐ │ ├┬┘├─┤ │ ├─┤
    └─┘ ┴ ┴└─┴ ┴ ┴ ┴ ┴
    "#;
    println!("{}", logo.bright_cyan().bold());
}

/// Sub-heading inside a command's output.
pub fn section(title: &str) {
    println!("{}", title.bold().white());
}

/// An aligned `key: value` line.
pub fn kv(key: &str, value: &str) {
    println!("  {:<10} {}", format!("{}:", key).dimmed(), value);
}

pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Errors go to stderr.
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

pub fn newline() {
    println!();
}

pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// A block of SQL, indented.
pub fn code(sql: &str) {
    println!();
    for line in sql.lines() {
        println!("  {}", line.bright_white());
    }
    println!();
}

/// Progress line printed before a script is executed.
pub fn script_started(script: &Script, index: usize, total: usize) {
    println!(
        "{} {}",
        progress_label(index + 1, total).dimmed(),
        script.name.bold()
    );
}

/// Outcome line printed under [`script_started`].
pub fn script_finished(result: &ExecutionResult) {
    if result.is_success() {
        println!("{}{} {}", RESULT_INDENT, "✔".green(), result.message.green());
    } else {
        println!("{}{} {}", RESULT_INDENT, "✖".red(), result.message.red());
    }
}

/// One numbered entry of `strata list`.
pub fn script_entry(script: &Script) {
    println!(
        "  {} {}",
        format!("{:>3}.", script.ordinal + 1).dimmed(),
        script_line(script)
    );
}

/// A reachable target. Unreachable ones surface as errors.
pub fn reachable(result: &ProbeResult) {
    success(&format!("Reachable: {}", result.detail));
}

/// Closing line of a completed run.
pub fn run_completed(report: &RunReport) {
    success(&report.summary());
}
