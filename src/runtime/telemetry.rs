use crate::orchestrator::events::{ItemOutcome, TerminalState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Rolling counters across every run of one orchestrator.
#[derive(Default, Debug)]
pub struct Telemetry {
    succeeded: AtomicU64,
    validation_failures: AtomicU64,
    call_failures: AtomicU64,
    skipped: AtomicU64,
    completed_runs: AtomicU64,
    aborted_runs: AtomicU64,
    cancelled_runs: AtomicU64,
    rejected_runs: AtomicU64,
}

impl Telemetry {
    pub fn record_outcome(&self, outcome: &ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Success { .. } => &self.succeeded,
            ItemOutcome::ValidationFailed { .. } => &self.validation_failures,
            ItemOutcome::CallFailed { .. } => &self.call_failures,
            ItemOutcome::Skipped { .. } => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_terminal(&self, state: &TerminalState) {
        let counter = match state {
            TerminalState::Completed => &self.completed_runs,
            TerminalState::Aborted { .. } => &self.aborted_runs,
            TerminalState::Cancelled { .. } => &self.cancelled_runs,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts runs refused before entering the loop (pre-flight or concurrency).
    pub fn record_rejected_run(&self) {
        self.rejected_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            call_failures: self.call_failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            completed_runs: self.completed_runs.load(Ordering::Relaxed),
            aborted_runs: self.aborted_runs.load(Ordering::Relaxed),
            cancelled_runs: self.cancelled_runs.load(Ordering::Relaxed),
            rejected_runs: self.rejected_runs.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub succeeded: u64,
    pub validation_failures: u64,
    pub call_failures: u64,
    pub skipped: u64,
    pub completed_runs: u64,
    pub aborted_runs: u64,
    pub cancelled_runs: u64,
    pub rejected_runs: u64,
}

impl TelemetrySnapshot {
    /// Items for which the exchange was called.
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.call_failures
    }
}
