//! Execution backend abstraction.
//!
//! A backend applies one script to the target database and reports the
//! outcome as an [`ExecutionResult`]. Backends never return errors to the
//! runner: connection failures and rejected statements are both folded
//! into a `Failure` result carrying the backend's error text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::script::Script;

/// Outcome of executing one script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOutcome {
    /// Every statement was accepted.
    Success,
    /// The script, or one of its statements, was rejected.
    Failure,
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

/// The result of one script execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Name of the script that was attempted.
    pub script_name: String,
    /// Whether it succeeded.
    pub outcome: ExecutionOutcome,
    /// Human readable detail; on failure this holds the backend error text.
    pub message: String,
}

impl ExecutionResult {
    /// A success result with the standard message.
    pub fn success(script_name: impl Into<String>) -> Self {
        let script_name = script_name.into();
        let message = format!("{} executed successfully", script_name);
        Self {
            script_name,
            outcome: ExecutionOutcome::Success,
            message,
        }
    }

    /// A failure result carrying `message` verbatim.
    pub fn failure(script_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            script_name: script_name.into(),
            outcome: ExecutionOutcome::Failure,
            message: message.into(),
        }
    }

    /// Whether the outcome is `Success`.
    pub fn is_success(&self) -> bool {
        self.outcome == ExecutionOutcome::Success
    }

    /// Whether the outcome is `Failure`.
    pub fn is_failure(&self) -> bool {
        self.outcome == ExecutionOutcome::Failure
    }
}

/// A strategy for applying a script to the target database.
///
/// Implementations own their connection target; the backend is chosen once
/// at startup and reused for every script of a run.
#[async_trait::async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Execute one script.
    async fn execute(&self, script: &Script) -> ExecutionResult;
}

#[async_trait::async_trait]
impl<B: ExecutionBackend + ?Sized> ExecutionBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn execute(&self, script: &Script) -> ExecutionResult {
        (**self).execute(script).await
    }
}
