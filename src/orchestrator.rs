//! Batch orchestration: the sequential validate → throttle → withdraw loop,
//! its status events, the throttle, and the caller-held stop handle.

pub mod batch;
pub mod events;
pub mod stop;
pub mod throttle;

pub use batch::{BatchError, BatchOrchestrator};
pub use events::{
    BatchReport, BatchWarning, ItemOutcome, NullSink, SkipReason, StatusEvent, StatusSink,
    TerminalState,
};
pub use stop::StopHandle;
pub use throttle::{Throttle, ThrottleOutcome};
