pub mod exchange;
pub mod input;
pub mod orchestrator;
pub mod runtime;
pub mod validation;

pub use exchange::{
    network_options, resolve_chain, ChainId, DryRunExchange, ExchangeClient, ExchangeError,
    NetworkOption, WithdrawalCall, WithdrawalReceipt,
};
pub use input::{parse, randomize_amounts, LineError, WithdrawalRequest};
pub use orchestrator::{
    BatchError, BatchOrchestrator, BatchReport, BatchWarning, ItemOutcome, NullSink, SkipReason,
    StatusEvent, StatusSink, StopHandle, TerminalState, Throttle, ThrottleOutcome,
};
pub use runtime::config::{BatchJob, BatchJobBuilder, BatchJobParams};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use validation::{
    validate_address, validate_amount, AddressPolicy, ValidationError, MIN_WITHDRAWAL_AMOUNT,
};
