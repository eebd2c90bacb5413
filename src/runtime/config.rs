use crate::input::{parse, WithdrawalRequest};
use crate::validation::AddressPolicy;
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;

/// Default lower bound of the randomized inter-request delay.
pub const DEFAULT_MIN_DELAY_SECS: u64 = 1;
/// Default upper bound of the randomized inter-request delay.
pub const DEFAULT_MAX_DELAY_SECS: u64 = 5;

/// One batch of withdrawals against a single account.
///
/// All instances must be constructed via [`BatchJob::builder`] or [`BatchJob::new`]
/// so invariants are validated before the orchestrator observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    asset: String,
    network: Option<String>,
    items: Vec<WithdrawalRequest>,
    min_delay_secs: u64,
    max_delay_secs: u64,
    available_balance: Decimal,
    address_policy: AddressPolicy,
    report_skipped: bool,
    halt_on_unauthorized: bool,
}

pub struct BatchJobParams {
    pub asset: String,
    pub network: Option<String>,
    pub items: Vec<WithdrawalRequest>,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub available_balance: Decimal,
    pub address_policy: AddressPolicy,
    pub report_skipped: bool,
    pub halt_on_unauthorized: bool,
}

impl BatchJob {
    /// Returns a builder to incrementally construct and validate a job.
    pub fn builder() -> BatchJobBuilder {
        BatchJobBuilder::default()
    }

    /// Constructs a job directly from the provided values.
    pub fn new(params: BatchJobParams) -> Result<Self> {
        let BatchJobParams {
            asset,
            network,
            items,
            min_delay_secs,
            max_delay_secs,
            available_balance,
            address_policy,
            report_skipped,
            halt_on_unauthorized,
        } = params;

        let job = Self {
            asset: asset.trim().to_owned(),
            network: network
                .map(|network| network.trim().to_owned())
                .filter(|network| !network.is_empty()),
            items,
            min_delay_secs,
            max_delay_secs,
            available_balance,
            address_policy,
            report_skipped,
            halt_on_unauthorized,
        };

        job.validate()?;
        Ok(job)
    }

    /// Asset symbol being withdrawn, as selected by the caller.
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Explicit network override, if the caller picked one.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    pub fn items(&self) -> &[WithdrawalRequest] {
        &self.items
    }

    pub fn min_delay_secs(&self) -> u64 {
        self.min_delay_secs
    }

    pub fn max_delay_secs(&self) -> u64 {
        self.max_delay_secs
    }

    /// Balance snapshot taken when the job was submitted.
    pub fn available_balance(&self) -> Decimal {
        self.available_balance
    }

    pub fn address_policy(&self) -> AddressPolicy {
        self.address_policy
    }

    /// Whether items left behind by an abort or cancellation get a `Skipped` event.
    pub fn report_skipped(&self) -> bool {
        self.report_skipped
    }

    /// Whether an `Unauthorized` call failure stops the batch.
    pub fn halt_on_unauthorized(&self) -> bool {
        self.halt_on_unauthorized
    }

    /// Sum of all requested amounts. Malformed lines contribute zero.
    pub fn requested_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.amount()))
    }

    /// Performs validation on an existing job instance.
    pub fn validate(&self) -> Result<()> {
        if self.asset.is_empty() {
            bail!("asset cannot be empty");
        }

        if self.items.is_empty() {
            bail!("items must contain at least one withdrawal");
        }

        if self.min_delay_secs > self.max_delay_secs {
            bail!(
                "min_delay_secs ({}) must not exceed max_delay_secs ({})",
                self.min_delay_secs,
                self.max_delay_secs
            );
        }

        if self.available_balance.is_sign_negative() && !self.available_balance.is_zero() {
            bail!(
                "available_balance must not be negative (got {})",
                self.available_balance
            );
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct BatchJobBuilder {
    asset: Option<String>,
    network: Option<String>,
    items: Option<Vec<WithdrawalRequest>>,
    min_delay_secs: Option<u64>,
    max_delay_secs: Option<u64>,
    available_balance: Option<Decimal>,
    address_policy: Option<AddressPolicy>,
    report_skipped: Option<bool>,
    halt_on_unauthorized: Option<bool>,
}

impl BatchJobBuilder {
    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn items(mut self, items: Vec<WithdrawalRequest>) -> Self {
        self.items = Some(items);
        self
    }

    /// Parses `address,amount` lines and uses them as the item list.
    pub fn input(self, raw_text: &str) -> Self {
        self.items(parse(raw_text))
    }

    pub fn delay_secs(mut self, min: u64, max: u64) -> Self {
        self.min_delay_secs = Some(min);
        self.max_delay_secs = Some(max);
        self
    }

    pub fn available_balance(mut self, balance: Decimal) -> Self {
        self.available_balance = Some(balance);
        self
    }

    pub fn address_policy(mut self, policy: AddressPolicy) -> Self {
        self.address_policy = Some(policy);
        self
    }

    pub fn report_skipped(mut self, enabled: bool) -> Self {
        self.report_skipped = Some(enabled);
        self
    }

    pub fn halt_on_unauthorized(mut self, enabled: bool) -> Self {
        self.halt_on_unauthorized = Some(enabled);
        self
    }

    pub fn build(self) -> Result<BatchJob> {
        let params = BatchJobParams {
            asset: self.asset.context("asset is required")?,
            network: self.network,
            items: self.items.context("items are required")?,
            min_delay_secs: self.min_delay_secs.unwrap_or(DEFAULT_MIN_DELAY_SECS),
            max_delay_secs: self.max_delay_secs.unwrap_or(DEFAULT_MAX_DELAY_SECS),
            available_balance: self
                .available_balance
                .context("available_balance is required")?,
            address_policy: self.address_policy.unwrap_or_default(),
            report_skipped: self.report_skipped.unwrap_or(false),
            halt_on_unauthorized: self.halt_on_unauthorized.unwrap_or(false),
        };

        BatchJob::new(params)
    }
}
