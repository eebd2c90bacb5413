use super::client::{ExchangeClient, ExchangeError, WithdrawalCall, WithdrawalReceipt};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// In-memory exchange that debits a local balance instead of moving funds.
///
/// Each accepted call costs `amount + fee`; calls that would overdraw the
/// balance fail with [`ExchangeError::InsufficientExchangeBalance`].
#[derive(Debug)]
pub struct DryRunExchange {
    balance: Mutex<Decimal>,
    fee: Decimal,
    latency: Duration,
    next_id: AtomicU64,
    calls: Mutex<Vec<WithdrawalCall>>,
}

impl DryRunExchange {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance: Mutex::new(balance),
            fee: Decimal::ZERO,
            latency: Duration::ZERO,
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Flat fee charged on top of every accepted withdrawal.
    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    /// Simulated round-trip time per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn balance(&self) -> Decimal {
        *self.balance.lock().await
    }

    /// Every call received so far, accepted or not.
    pub async fn calls(&self) -> Vec<WithdrawalCall> {
        self.calls.lock().await.clone()
    }

    async fn execute(&self, call: &WithdrawalCall) -> Result<WithdrawalReceipt, ExchangeError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        self.calls.lock().await.push(call.clone());

        if call.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters {
                message: format!("amount {} must be positive", call.amount),
            });
        }

        let mut balance = self.balance.lock().await;
        let cost = call.amount + self.fee;
        if cost > *balance {
            return Err(ExchangeError::InsufficientExchangeBalance {
                message: format!("{} {} requested, {} available", cost, call.currency, *balance),
            });
        }
        *balance -= cost;
        let remaining = *balance;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            chain = %call.chain,
            address = %call.address,
            amount = %call.amount,
            remaining = %remaining,
            "dry-run withdrawal accepted"
        );

        Ok(WithdrawalReceipt {
            withdrawal_id: format!("dry-run-{id}"),
            fee: self.fee,
            confirmed_amount: call.amount,
        })
    }
}

impl ExchangeClient for DryRunExchange {
    fn withdraw<'a>(
        &'a self,
        call: &'a WithdrawalCall,
    ) -> BoxFuture<'a, Result<WithdrawalReceipt, ExchangeError>> {
        Box::pin(self.execute(call))
    }
}
