//! Per-item checks applied before a withdrawal is sent: address format per
//! asset and amount bounds against the running balance.

pub mod address;
pub mod amount;

pub use address::{validate_address, AddressPolicy};
pub use amount::{validate_amount, MIN_WITHDRAWAL_AMOUNT};

use crate::input::LineError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Non-fatal, per-item rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    MalformedLine {
        error: LineError,
    },
    InvalidAddressFormat {
        asset: String,
    },
    NonPositiveAmount,
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },
    BelowMinimum {
        minimum: Decimal,
        asset: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MalformedLine { error } => write!(f, "malformed line: {error}"),
            ValidationError::InvalidAddressFormat { asset } => {
                write!(f, "invalid {asset} address format")
            }
            ValidationError::NonPositiveAmount => write!(f, "amount must be greater than 0"),
            ValidationError::InsufficientBalance {
                requested,
                available,
            } => write!(
                f,
                "insufficient balance: requested {requested}, available {available}"
            ),
            ValidationError::BelowMinimum { minimum, asset } => {
                write!(f, "minimum withdrawal is {minimum} {asset}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<LineError> for ValidationError {
    fn from(error: LineError) -> Self {
        ValidationError::MalformedLine { error }
    }
}
