//! Strata CLI - apply ordered SQL scripts to a hosted PostgreSQL project.
//!
//! This crate provides the `strata` binary: argument parsing, `strata.toml`
//! configuration, backend selection, styled output and logging setup.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
