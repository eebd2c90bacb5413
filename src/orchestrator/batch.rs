//! The batch state machine.
//!
//! `Idle → Running → {Completed, Aborted, Cancelled}`. Items are processed
//! strictly in order; each one is validated against the running balance,
//! throttled, then sent. The only suspension points are the throttle wait and
//! the exchange call, and the stop handle is observed at the wait and before
//! every item.

use super::events::{
    BatchReport, BatchWarning, ItemOutcome, SkipReason, StatusEvent, StatusSink, TerminalState,
};
use super::stop::StopHandle;
use super::throttle::{Throttle, ThrottleOutcome};
use crate::exchange::{resolve_chain, ChainId, ExchangeClient, ExchangeError, WithdrawalCall};
use crate::input::WithdrawalRequest;
use crate::runtime::config::BatchJob;
use crate::runtime::telemetry::Telemetry;
use crate::validation::{validate_address, validate_amount, ValidationError};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reasons a run is refused before any item is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Another run is still active on this orchestrator.
    RunInProgress,
    /// Pre-flight budget check failed: the batch asks for more than the snapshot holds.
    InsufficientBalance {
        requested: Option<Decimal>,
        available: Decimal,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::RunInProgress => write!(f, "a batch is already running for this account"),
            BatchError::InsufficientBalance {
                requested: Some(requested),
                available,
            } => write!(
                f,
                "batch total {requested} exceeds available balance {available}"
            ),
            BatchError::InsufficientBalance {
                requested: None,
                available,
            } => write!(
                f,
                "batch total overflows and exceeds available balance {available}"
            ),
        }
    }
}

impl std::error::Error for BatchError {}

/// Drives one batch at a time against a single exchange account.
pub struct BatchOrchestrator {
    client: Arc<dyn ExchangeClient>,
    throttle: Throttle,
    telemetry: Arc<Telemetry>,
    running: AtomicBool,
}

/// Mutable bookkeeping private to a single `run` call.
#[derive(Debug)]
struct RunState {
    remaining_budget: Decimal,
    deducted: Decimal,
    index: usize,
    unauthorized_reported: bool,
}

impl RunState {
    fn new(available: Decimal) -> Self {
        Self {
            remaining_budget: available,
            deducted: Decimal::ZERO,
            index: 0,
            unauthorized_reported: false,
        }
    }

    fn deduct(&mut self, amount: Decimal) {
        let next = self.remaining_budget - amount;
        self.remaining_budget = next.max(Decimal::ZERO);
        self.deducted += amount;
    }
}

/// Clears the running flag when a run returns or its future is dropped.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

enum Flow {
    Continue,
    Halt(TerminalState),
}

struct EventLog<'s, S: StatusSink + ?Sized> {
    sink: &'s mut S,
    events: Vec<StatusEvent>,
}

impl<S: StatusSink + ?Sized> EventLog<'_, S> {
    fn record(&mut self, index: usize, request: &WithdrawalRequest, outcome: ItemOutcome) {
        let event = StatusEvent {
            index,
            line_number: request.line_number(),
            address: request.address().to_owned(),
            amount: request.amount(),
            outcome,
        };
        self.sink.emit(&event);
        self.events.push(event);
    }
}

impl BatchOrchestrator {
    pub fn new(client: Arc<dyn ExchangeClient>) -> Self {
        Self::with_telemetry(client, Arc::new(Telemetry::default()))
    }

    pub fn with_telemetry(client: Arc<dyn ExchangeClient>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            client,
            throttle: Throttle,
            telemetry,
            running: AtomicBool::new(false),
        }
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// True while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs `job` to a terminal state, emitting one event per processed item
    /// to `sink` in order and returning the full log.
    ///
    /// Fails without emitting anything when another run is active or the
    /// pre-flight budget check fails.
    pub async fn run<S>(
        &self,
        job: BatchJob,
        sink: &mut S,
        stop: &StopHandle,
    ) -> Result<BatchReport, BatchError>
    where
        S: StatusSink + ?Sized,
    {
        let _guard = self.acquire()?;
        self.preflight(&job)?;

        let chain = resolve_chain(job.asset(), job.network());
        tracing::info!(
            asset = job.asset(),
            chain = %chain.chain,
            items = job.items().len(),
            available = %job.available_balance(),
            min_delay_secs = job.min_delay_secs(),
            max_delay_secs = job.max_delay_secs(),
            "starting withdrawal batch"
        );

        let mut state = RunState::new(job.available_balance());
        let mut log = EventLog {
            sink,
            events: Vec::with_capacity(job.items().len()),
        };
        let mut warnings = Vec::new();

        let mut terminal = TerminalState::Completed;
        for (index, request) in job.items().iter().enumerate() {
            state.index = index;

            if stop.is_stopped() {
                tracing::info!(next_index = index, "stop requested; halting batch");
                terminal = TerminalState::Cancelled { next_index: index };
                break;
            }

            let flow = self
                .process_item(&job, &chain, request, &mut state, &mut log, &mut warnings, stop)
                .await;

            if let Flow::Halt(end) = flow {
                terminal = end;
                break;
            }
        }

        if job.report_skipped() {
            self.report_skipped(&job, &terminal, &mut log);
        }

        self.telemetry.record_terminal(&terminal);
        let report = BatchReport {
            state: terminal,
            chain: chain.chain,
            events: log.events,
            warnings,
            total_withdrawn: state.deducted,
            remaining_balance: state.remaining_budget,
        };

        tracing::info!(
            state = ?report.state,
            events = report.events.len(),
            withdrawn = %report.total_withdrawn,
            remaining = %report.remaining_balance,
            "withdrawal batch finished"
        );

        Ok(report)
    }

    fn acquire(&self) -> Result<RunGuard<'_>, BatchError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("rejecting batch: another run is in progress");
            self.telemetry.record_rejected_run();
            return Err(BatchError::RunInProgress);
        }
        Ok(RunGuard {
            running: &self.running,
        })
    }

    fn preflight(&self, job: &BatchJob) -> Result<(), BatchError> {
        let available = job.available_balance();
        match job.requested_total() {
            Some(total) if total <= available => Ok(()),
            requested => {
                tracing::warn!(
                    requested = ?requested,
                    available = %available,
                    asset = job.asset(),
                    "batch total exceeds available balance; refusing to start"
                );
                self.telemetry.record_rejected_run();
                Err(BatchError::InsufficientBalance {
                    requested,
                    available,
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_item<S: StatusSink + ?Sized>(
        &self,
        job: &BatchJob,
        chain: &ChainId,
        request: &WithdrawalRequest,
        state: &mut RunState,
        log: &mut EventLog<'_, S>,
        warnings: &mut Vec<BatchWarning>,
        stop: &StopHandle,
    ) -> Flow {
        let index = state.index;

        if let Err(reason) = self.validate(job, request, state.remaining_budget) {
            tracing::info!(
                index,
                line = request.line_number(),
                address = request.address(),
                error = %reason,
                "withdrawal failed validation"
            );
            self.emit(log, index, request, ItemOutcome::ValidationFailed { reason });
            return Flow::Continue;
        }

        match self
            .throttle
            .wait(job.min_delay_secs(), job.max_delay_secs(), stop)
            .await
        {
            ThrottleOutcome::Elapsed(_) => {}
            ThrottleOutcome::Cancelled => {
                tracing::info!(next_index = index, "stop requested during throttle wait");
                return Flow::Halt(TerminalState::Cancelled { next_index: index });
            }
        }

        let call = WithdrawalCall {
            currency: chain.currency.clone(),
            chain: chain.chain.clone(),
            address: request.address().to_owned(),
            amount: request.amount(),
        };

        match self.client.withdraw(&call).await {
            Ok(receipt) => {
                state.deduct(request.amount());
                tracing::info!(
                    index,
                    address = request.address(),
                    amount = %request.amount(),
                    withdrawal_id = %receipt.withdrawal_id,
                    remaining = %state.remaining_budget,
                    "withdrawal accepted"
                );
                self.emit(log, index, request, ItemOutcome::Success { receipt });
                Flow::Continue
            }
            Err(reason) => {
                tracing::warn!(
                    index,
                    address = request.address(),
                    amount = %request.amount(),
                    error = %reason,
                    "withdrawal call failed"
                );
                let flow = self.classify_failure(job, index, &reason, state, warnings);
                self.emit(log, index, request, ItemOutcome::CallFailed { reason });
                flow
            }
        }
    }

    fn validate(
        &self,
        job: &BatchJob,
        request: &WithdrawalRequest,
        remaining_budget: Decimal,
    ) -> Result<(), ValidationError> {
        if let Some(error) = request.parse_error() {
            return Err(error.clone().into());
        }
        validate_address(request.address(), job.asset(), job.address_policy())?;
        validate_amount(request.amount(), remaining_budget, job.asset())
    }

    fn classify_failure(
        &self,
        job: &BatchJob,
        index: usize,
        reason: &ExchangeError,
        state: &mut RunState,
        warnings: &mut Vec<BatchWarning>,
    ) -> Flow {
        if reason.is_fatal() {
            tracing::error!(
                index,
                error = %reason,
                "exchange balance exhausted; aborting remaining withdrawals"
            );
            return Flow::Halt(TerminalState::Aborted {
                index,
                reason: reason.clone(),
            });
        }

        if let ExchangeError::Unauthorized { message } = reason {
            if !state.unauthorized_reported {
                state.unauthorized_reported = true;
                tracing::warn!(
                    index,
                    "exchange rejected credentials; remaining withdrawals will likely fail"
                );
                warnings.push(BatchWarning::Unauthorized {
                    index,
                    message: message.clone(),
                });
            }
            if job.halt_on_unauthorized() {
                return Flow::Halt(TerminalState::Aborted {
                    index,
                    reason: reason.clone(),
                });
            }
        }

        Flow::Continue
    }

    fn report_skipped<S: StatusSink + ?Sized>(
        &self,
        job: &BatchJob,
        terminal: &TerminalState,
        log: &mut EventLog<'_, S>,
    ) {
        let (first_skipped, reason) = match terminal {
            TerminalState::Completed => return,
            TerminalState::Aborted { index, .. } => (index + 1, SkipReason::Aborted),
            TerminalState::Cancelled { next_index } => (*next_index, SkipReason::Cancelled),
        };

        for (index, request) in job.items().iter().enumerate().skip(first_skipped) {
            self.emit(log, index, request, ItemOutcome::Skipped { reason });
        }
    }

    fn emit<S: StatusSink + ?Sized>(
        &self,
        log: &mut EventLog<'_, S>,
        index: usize,
        request: &WithdrawalRequest,
        outcome: ItemOutcome,
    ) {
        self.telemetry.record_outcome(&outcome);
        log.record(index, request, outcome);
    }
}
