use crate::exchange::{ExchangeError, WithdrawalReceipt};
use crate::validation::ValidationError;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;

/// Why an item was never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Aborted,
    Cancelled,
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Success { receipt: WithdrawalReceipt },
    ValidationFailed { reason: ValidationError },
    CallFailed { reason: ExchangeError },
    Skipped { reason: SkipReason },
}

impl ItemOutcome {
    /// True when the exchange was actually called for this item.
    pub fn was_attempted(&self) -> bool {
        matches!(
            self,
            ItemOutcome::Success { .. } | ItemOutcome::CallFailed { .. }
        )
    }
}

/// Per-item status, emitted in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    /// Position of the item in the job.
    pub index: usize,
    pub line_number: usize,
    pub address: String,
    pub amount: Decimal,
    pub outcome: ItemOutcome,
}

/// Batch-level conditions worth surfacing beyond the per-item events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchWarning {
    /// The exchange rejected credentials; later calls will most likely fail too.
    Unauthorized { index: usize, message: String },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TerminalState {
    Completed,
    Aborted { index: usize, reason: ExchangeError },
    Cancelled { next_index: usize },
}

/// Full ordered outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub state: TerminalState,
    pub chain: String,
    pub events: Vec<StatusEvent>,
    pub warnings: Vec<BatchWarning>,
    pub total_withdrawn: Decimal,
    pub remaining_balance: Decimal,
}

impl BatchReport {
    pub fn successes(&self) -> impl Iterator<Item = &StatusEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event.outcome, ItemOutcome::Success { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatusEvent> {
        self.events.iter().filter(|event| {
            matches!(
                event.outcome,
                ItemOutcome::ValidationFailed { .. } | ItemOutcome::CallFailed { .. }
            )
        })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, TerminalState::Completed)
    }
}

/// Receiver of status events, owned by the caller.
pub trait StatusSink {
    fn emit(&mut self, event: &StatusEvent);
}

impl StatusSink for Vec<StatusEvent> {
    fn emit(&mut self, event: &StatusEvent) {
        self.push(event.clone());
    }
}

impl StatusSink for mpsc::UnboundedSender<StatusEvent> {
    fn emit(&mut self, event: &StatusEvent) {
        if self.send(event.clone()).is_err() {
            tracing::debug!(index = event.index, "status receiver dropped; event discarded");
        }
    }
}

/// Sink for callers that only need the returned [`BatchReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn emit(&mut self, _event: &StatusEvent) {}
}
