//! Contract between the orchestrator and whatever signs and sends withdrawal
//! requests to the exchange. Transport and signing live behind
//! [`ExchangeClient`]; the orchestrator only sees receipts and typed failures.

use futures::future::BoxFuture;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Fields sent to the exchange for one withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalCall {
    /// Base currency symbol, e.g. `USDT`.
    pub currency: String,
    /// Chain-qualified identifier, e.g. `USDT-TRC20`.
    pub chain: String,
    pub address: String,
    pub amount: Decimal,
}

/// Successful withdrawal as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalReceipt {
    pub withdrawal_id: String,
    pub fee: Decimal,
    pub confirmed_amount: Decimal,
}

/// Classified withdrawal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeError {
    InsufficientExchangeBalance { message: String },
    InvalidParameters { message: String },
    Unauthorized { message: String },
    TransientNetworkError { message: String },
}

impl ExchangeError {
    /// Whether the failure invalidates every remaining item in the batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExchangeError::InsufficientExchangeBalance { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ExchangeError::InsufficientExchangeBalance { message }
            | ExchangeError::InvalidParameters { message }
            | ExchangeError::Unauthorized { message }
            | ExchangeError::TransientNetworkError { message } => message,
        }
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::InsufficientExchangeBalance { message } => {
                write!(f, "insufficient exchange balance: {message}")
            }
            ExchangeError::InvalidParameters { message } => {
                write!(f, "invalid withdrawal parameters: {message}")
            }
            ExchangeError::Unauthorized { message } => {
                write!(f, "exchange rejected credentials: {message}")
            }
            ExchangeError::TransientNetworkError { message } => {
                write!(f, "transient network error: {message}")
            }
        }
    }
}

impl std::error::Error for ExchangeError {}

/// Signs and sends a single withdrawal. Implementations must not retry on
/// their own; the orchestrator decides what a failure means for the batch.
pub trait ExchangeClient: Send + Sync {
    fn withdraw<'a>(
        &'a self,
        call: &'a WithdrawalCall,
    ) -> BoxFuture<'a, Result<WithdrawalReceipt, ExchangeError>>;
}
