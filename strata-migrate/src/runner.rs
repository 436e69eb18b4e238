//! Migration runner.
//!
//! The runner walks a [`ScriptSet`] in ordinal order, hands each script to
//! the selected [`ExecutionBackend`] and stops at the first failure.
//!
//! ```text
//!          run()
//!   Idle ─────────▶ Running ──── all Success ───▶ Completed
//!                      │
//!                      └──── first Failure ─────▶ Halted
//! ```
//!
//! Every run starts from a fresh [`RunState`]; nothing is persisted between
//! runs, so re-running after a halt starts again at the first script and
//! relies on the scripts being idempotent.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::backend::{ExecutionBackend, ExecutionResult};
use crate::error::{MigrateResult, MigrationError};
use crate::script::{Script, ScriptSet};

/// Configuration for the runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Delay inserted between consecutive scripts so a human can follow
    /// progress. Zero disables pacing.
    pub pace: Duration,
}

impl RunnerConfig {
    /// Create a configuration without pacing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pacing delay.
    pub fn pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// Not started.
    Idle,
    /// Applying scripts.
    Running,
    /// Every script succeeded.
    Completed,
    /// A script failed and the run stopped there.
    Halted,
}

impl RunPhase {
    /// Whether this phase is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Halted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Halted => "halted",
        };
        f.write_str(s)
    }
}

/// Per-run state, exclusively owned by one invocation.
#[derive(Debug)]
pub struct RunState {
    phase: RunPhase,
    results: Vec<ExecutionResult>,
    halted: bool,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// A fresh, idle state.
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            results: Vec::new(),
            halted: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Results recorded so far, in attempt order.
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// Whether a failure has been recorded.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn begin(&mut self) {
        debug_assert_eq!(self.phase, RunPhase::Idle);
        self.phase = RunPhase::Running;
    }

    /// Record a result; a failure halts the run immediately.
    fn record(&mut self, result: ExecutionResult) -> &ExecutionResult {
        debug_assert_eq!(self.phase, RunPhase::Running);
        if result.is_failure() {
            self.halted = true;
            self.phase = RunPhase::Halted;
        }
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    fn finish(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = RunPhase::Completed;
        }
    }
}

/// Progress notification emitted once per attempted script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Zero-based index of the script in the set.
    pub index: usize,
    /// Number of scripts in the set.
    pub total: usize,
    /// The result of the attempt.
    pub result: ExecutionResult,
}

impl ProgressEvent {
    /// One-based position, i.e. the numerator of `(index + 1) / total`.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.position() as f64 / self.total as f64
        }
    }
}

/// Receives progress while a run is in flight.
pub trait RunObserver: Send {
    /// A script is about to be handed to the backend.
    fn on_script_start(&mut self, _script: &Script, _index: usize, _total: usize) {}

    /// A script attempt finished.
    fn on_progress(&mut self, event: &ProgressEvent);

    /// The run reached a terminal phase.
    fn on_finish(&mut self, _report: &RunReport) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// Forwards progress events into a channel, for callers that render the
/// result stream on another task. A closed receiver is ignored.
impl RunObserver for UnboundedSender<ProgressEvent> {
    fn on_progress(&mut self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}

/// What a run operates on: the script set and the backend selected at
/// startup.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    /// Scripts to apply.
    pub scripts: &'a ScriptSet,
    /// Backend that applies them.
    pub backend: &'a dyn ExecutionBackend,
}

impl<'a> RunContext<'a> {
    /// Create a run context.
    pub fn new(scripts: &'a ScriptSet, backend: &'a dyn ExecutionBackend) -> Self {
        Self { scripts, backend }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal phase.
    pub phase: RunPhase,
    /// One result per attempted script, in order.
    pub results: Vec<ExecutionResult>,
    /// Number of scripts in the set.
    pub total: usize,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: i64,
}

impl RunReport {
    /// Whether the run stopped on a failure.
    pub fn is_halted(&self) -> bool {
        self.phase == RunPhase::Halted
    }

    /// Whether every script succeeded.
    pub fn is_completed(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    /// Number of scripts that succeeded.
    pub fn applied_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of scripts never attempted because of a halt.
    pub fn unattempted_count(&self) -> usize {
        self.total - self.results.len()
    }

    /// The failure that halted the run, if any.
    pub fn failure(&self) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| r.is_failure())
    }

    /// One line summary.
    pub fn summary(&self) -> String {
        match self.failure() {
            Some(failed) => format!(
                "halted at {} after {} applied ({} not attempted) in {}ms",
                failed.script_name,
                self.applied_count(),
                self.unattempted_count(),
                self.duration_ms
            ),
            None if self.total == 0 => "No scripts to apply".to_string(),
            None => format!("{} applied in {}ms", self.applied_count(), self.duration_ms),
        }
    }
}

/// Applies script sets with halt-on-first-failure semantics.
#[derive(Debug, Clone, Default)]
pub struct MigrationRunner {
    config: RunnerConfig,
}

impl MigrationRunner {
    /// Create a runner.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// The runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Apply every script in order, stopping at the first failure.
    ///
    /// Scripts after a failed one are never handed to the backend and get
    /// neither a result nor a progress event.
    pub async fn run(
        &self,
        ctx: RunContext<'_>,
        observer: &mut dyn RunObserver,
    ) -> RunReport {
        let start = Instant::now();
        let total = ctx.scripts.len();
        let mut state = RunState::new();
        state.begin();

        info!(
            backend = ctx.backend.name(),
            scripts = total,
            "Starting migration run"
        );

        for (index, script) in ctx.scripts.iter().enumerate() {
            if index > 0 && !self.config.pace.is_zero() {
                tokio::time::sleep(self.config.pace).await;
            }

            observer.on_script_start(script, index, total);
            debug!(script = %script.name, index, total, "Executing script");

            let result = ctx.backend.execute(script).await;
            let result = state.record(result);

            if result.is_success() {
                info!(script = %result.script_name, "Script applied");
            } else {
                warn!(
                    script = %result.script_name,
                    message = %result.message,
                    "Script failed, halting run"
                );
            }

            observer.on_progress(&ProgressEvent {
                index,
                total,
                result: result.clone(),
            });

            if state.is_halted() {
                break;
            }
        }

        state.finish();

        let report = RunReport {
            phase: state.phase,
            results: state.results,
            total,
            duration_ms: start.elapsed().as_millis() as i64,
        };

        info!(phase = %report.phase, summary = %report.summary(), "Migration run finished");
        observer.on_finish(&report);
        report
    }

    /// Apply a single script by name.
    pub async fn run_one(
        &self,
        ctx: RunContext<'_>,
        name: &str,
        observer: &mut dyn RunObserver,
    ) -> MigrateResult<ExecutionResult> {
        let script = ctx
            .scripts
            .get(name)
            .ok_or_else(|| MigrationError::ScriptNotFound(name.to_string()))?;

        observer.on_script_start(script, script.ordinal, ctx.scripts.len());
        let result = ctx.backend.execute(script).await;

        observer.on_progress(&ProgressEvent {
            index: script.ordinal,
            total: ctx.scripts.len(),
            result: result.clone(),
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    /// Fails the scripts named in `fail`, records every call.
    struct ScriptedBackend {
        fail: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(fail: Vec<&'static str>) -> Self {
            Self {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ExecutionBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn execute(&self, script: &Script) -> ExecutionResult {
            self.calls.lock().unwrap().push(script.name.clone());
            if self.fail.contains(&script.name.as_str()) {
                ExecutionResult::failure(&script.name, "boom")
            } else {
                ExecutionResult::success(&script.name)
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<usize>,
        events: Vec<ProgressEvent>,
        finished: Option<RunPhase>,
    }

    impl RunObserver for Recorder {
        fn on_script_start(&mut self, _script: &Script, index: usize, _total: usize) {
            self.started.push(index);
        }

        fn on_progress(&mut self, event: &ProgressEvent) {
            self.events.push(event.clone());
        }

        fn on_finish(&mut self, report: &RunReport) {
            self.finished = Some(report.phase);
        }
    }

    fn set(names: &[&str]) -> ScriptSet {
        ScriptSet::from_scripts(names.iter().map(|n| Script::new(*n, "SELECT 1"))).unwrap()
    }

    #[tokio::test]
    async fn test_all_success_completes() {
        let scripts = set(&["a", "b", "c"]);
        let backend = ScriptedBackend::new(vec![]);
        let mut recorder = Recorder::default();

        let report = MigrationRunner::default()
            .run(RunContext::new(&scripts, &backend), &mut recorder)
            .await;

        assert_eq!(report.phase, RunPhase::Completed);
        assert_eq!(report.results.len(), 3);
        assert!(report.results.iter().all(|r| r.is_success()));
        assert_eq!(backend.calls(), vec!["a", "b", "c"]);
        assert_eq!(recorder.started, vec![0, 1, 2]);
        assert_eq!(
            recorder.events.iter().map(|e| e.position()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(recorder.finished, Some(RunPhase::Completed));
        assert_eq!(report.unattempted_count(), 0);
    }

    #[tokio::test]
    async fn test_halts_on_first_failure() {
        let scripts = set(&["01", "02", "03", "04"]);
        let backend = ScriptedBackend::new(vec!["02", "04"]);
        let mut recorder = Recorder::default();

        let report = MigrationRunner::default()
            .run(RunContext::new(&scripts, &backend), &mut recorder)
            .await;

        assert_eq!(report.phase, RunPhase::Halted);
        assert_eq!(backend.calls(), vec!["01", "02"]);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].is_success());
        assert!(report.results[1].is_failure());
        assert_eq!(recorder.events.len(), 2);
        assert_eq!(report.unattempted_count(), 2);
        assert_eq!(report.failure().unwrap().script_name, "02");
        assert!(report.summary().contains("halted at 02"));
    }

    #[tokio::test]
    async fn test_empty_set_completes() {
        let scripts = ScriptSet::default();
        let backend = ScriptedBackend::new(vec![]);

        let report = MigrationRunner::default()
            .run(RunContext::new(&scripts, &backend), &mut NoopObserver)
            .await;

        assert!(report.is_completed());
        assert!(backend.calls().is_empty());
        assert_eq!(report.summary(), "No scripts to apply");
    }

    #[tokio::test]
    async fn test_channel_observer() {
        let scripts = set(&["a", "b"]);
        let backend = ScriptedBackend::new(vec![]);
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        MigrationRunner::default()
            .run(RunContext::new(&scripts, &backend), &mut tx)
            .await;
        drop(tx);

        let mut fractions = Vec::new();
        while let Some(event) = rx.recv().await {
            fractions.push(event.fraction());
        }
        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_between_scripts() {
        let scripts = set(&["a", "b", "c"]);
        let backend = ScriptedBackend::new(vec![]);
        let runner = MigrationRunner::new(RunnerConfig::new().pace(Duration::from_millis(500)));

        let start = tokio::time::Instant::now();
        runner
            .run(RunContext::new(&scripts, &backend), &mut NoopObserver)
            .await;

        // Two gaps between three scripts.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_run_one() {
        let scripts = set(&["a", "b"]);
        let backend = ScriptedBackend::new(vec!["b"]);
        let runner = MigrationRunner::default();
        let ctx = RunContext::new(&scripts, &backend);

        let result = runner.run_one(ctx, "b", &mut NoopObserver).await.unwrap();
        assert!(result.is_failure());
        assert_eq!(backend.calls(), vec!["b"]);

        let err = runner
            .run_one(ctx, "missing", &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::ScriptNotFound(n) if n == "missing"));
    }

    #[test]
    fn test_state_transitions() {
        let mut state = RunState::new();
        assert_eq!(state.phase(), RunPhase::Idle);

        state.begin();
        assert_eq!(state.phase(), RunPhase::Running);

        state.record(ExecutionResult::success("a"));
        assert!(!state.is_halted());

        state.record(ExecutionResult::failure("b", "x"));
        assert!(state.is_halted());
        assert_eq!(state.phase(), RunPhase::Halted);

        state.finish();
        assert_eq!(state.phase(), RunPhase::Halted);
        assert!(state.phase().is_terminal());
        assert_eq!(state.results().len(), 2);
    }
}
