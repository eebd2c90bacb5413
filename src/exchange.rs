//! Exchange boundary: the withdrawal client trait, typed call failures,
//! chain-qualified identifiers, and an in-memory dry-run exchange.

pub mod classify;
pub mod client;
pub mod dry_run;
pub mod network;

pub use client::{ExchangeClient, ExchangeError, WithdrawalCall, WithdrawalReceipt};
pub use dry_run::DryRunExchange;
pub use network::{network_options, resolve_chain, ChainId, NetworkOption};
