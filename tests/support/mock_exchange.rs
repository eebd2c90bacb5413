use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use batch_withdraw::{ExchangeClient, ExchangeError, WithdrawalCall, WithdrawalReceipt};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use tokio::sync::{Notify, Semaphore};

/// One scripted reply, consumed in call order.
#[derive(Clone, Debug)]
pub enum Reply {
    Accept,
    Reject(ExchangeError),
}

/// Exchange double that replays scripted replies and records every call.
///
/// Calls past the end of the script are accepted. When gated, each call
/// announces itself on `entered` and then blocks until [`MockExchange::release`].
#[derive(Clone)]
pub struct MockExchange {
    inner: Arc<MockInner>,
}

struct MockInner {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<WithdrawalCall>>,
    gate: Option<Semaphore>,
    entered: Notify,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(script: Vec<Reply>) -> Self {
        Self::build(script, None)
    }

    /// Every call waits for an explicit [`MockExchange::release`].
    pub fn gated(script: Vec<Reply>) -> Self {
        Self::build(script, Some(Semaphore::new(0)))
    }

    fn build(script: Vec<Reply>, gate: Option<Semaphore>) -> Self {
        Self {
            inner: Arc::new(MockInner {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                gate,
                entered: Notify::new(),
            }),
        }
    }

    pub fn calls(&self) -> Vec<WithdrawalCall> {
        self.inner.calls.lock().expect("calls poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().expect("calls poisoned").len()
    }

    /// Resolves once a call has reached the exchange.
    pub async fn wait_for_call(&self) {
        self.inner.entered.notified().await;
    }

    /// Lets one gated call through.
    pub fn release(&self) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(1);
        }
    }

    pub fn as_client(&self) -> Arc<dyn ExchangeClient> {
        Arc::new(self.clone())
    }
}

impl ExchangeClient for MockExchange {
    fn withdraw<'a>(
        &'a self,
        call: &'a WithdrawalCall,
    ) -> BoxFuture<'a, Result<WithdrawalReceipt, ExchangeError>> {
        Box::pin(async move {
            let number = {
                let mut calls = self.inner.calls.lock().expect("calls poisoned");
                calls.push(call.clone());
                calls.len()
            };
            let reply = self
                .inner
                .script
                .lock()
                .expect("script poisoned")
                .pop_front()
                .unwrap_or(Reply::Accept);

            self.inner.entered.notify_one();
            if let Some(gate) = &self.inner.gate {
                gate.acquire()
                    .await
                    .expect("mock gate closed")
                    .forget();
            }

            match reply {
                Reply::Accept => Ok(WithdrawalReceipt {
                    withdrawal_id: format!("mock-{number}"),
                    fee: Decimal::ZERO,
                    confirmed_amount: call.amount,
                }),
                Reply::Reject(error) => Err(error),
            }
        })
    }
}
