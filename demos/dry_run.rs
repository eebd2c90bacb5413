use std::env;
use std::fs;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use batch_withdraw::{
    randomize_amounts, AddressPolicy, BatchJob, BatchOrchestrator, DryRunExchange, ItemOutcome,
    Runner, StatusEvent, StatusSink,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rust_decimal::Decimal;

const DEFAULT_ASSET: &str = "USDT";
const DEFAULT_BALANCE: i64 = 100;
const DEFAULT_MIN_DELAY_SECS: u64 = 1;
const DEFAULT_MAX_DELAY_SECS: u64 = 3;
const DEFAULT_DECIMALS: u32 = 4;
const DEFAULT_LOG_DIRECTIVE: &str = "warn";

const SAMPLE_INPUT: &str = "\
0x1111111111111111111111111111111111111111,1.5
0x2222222222222222222222222222222222222222,2
not-an-address,1
0x3333333333333333333333333333333333333333
0x4444444444444444444444444444444444444444,0.00001
0x5555555555555555555555555555555555555555,3.25";

#[tokio::main]
async fn main() -> Result<()> {
    init_example_tracing();

    let args = ExampleArgs::from_env()?;
    let job = args.to_job()?;

    let bar = build_progress_bar(job.items().len() as u64);
    bar.println(format!(
        "Dry-run batch of {} {} withdrawals against balance {}",
        job.items().len(),
        job.asset(),
        job.available_balance()
    ));

    let exchange = Arc::new(DryRunExchange::new(args.exchange_balance).with_fee(args.fee));
    let mut runner = Runner::with_orchestrator(BatchOrchestrator::new(exchange.clone()));
    let mut sink = ProgressSink { bar: bar.clone() };

    let report = runner.run_until_ctrl_c(job, &mut sink).await?;
    bar.finish_with_message(format!("{:?}", report.state));

    let snapshot = runner.orchestrator().telemetry().snapshot();
    bar.println(format!(
        "{} succeeded, {} rejected, {} failed at the exchange; {} withdrawn, exchange balance now {}",
        snapshot.succeeded,
        snapshot.validation_failures,
        snapshot.call_failures,
        report.total_withdrawn,
        exchange.balance().await
    ));
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize batch report")?
    );

    Ok(())
}

/// Advances the progress bar once per status event.
struct ProgressSink {
    bar: ProgressBar,
}

impl StatusSink for ProgressSink {
    fn emit(&mut self, event: &StatusEvent) {
        let status = match &event.outcome {
            ItemOutcome::Success { receipt } => format!("ok {}", receipt.withdrawal_id),
            ItemOutcome::ValidationFailed { reason } => format!("rejected: {reason}"),
            ItemOutcome::CallFailed { reason } => format!("failed: {reason}"),
            ItemOutcome::Skipped { reason } => format!("skipped ({reason:?})"),
        };
        self.bar.println(format!(
            "line {:>3} {} {} -> {}",
            event.line_number, event.address, event.amount, status
        ));
        self.bar.inc(1);
    }
}

fn init_example_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    batch_withdraw::init_tracing();
}

fn build_progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stdout_with_hz(12));
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} withdrawals {msg}",
    )
    .expect("valid progress bar template")
    .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

struct ExampleArgs {
    asset: String,
    network: Option<String>,
    input: String,
    available_balance: Decimal,
    exchange_balance: Decimal,
    fee: Decimal,
    min_delay_secs: u64,
    max_delay_secs: u64,
    strict_addresses: bool,
    random_range: Option<(Decimal, Decimal, u32)>,
}

impl ExampleArgs {
    fn from_env() -> Result<Self> {
        let asset = read_env_or_default("BATCHWITHDRAW_ASSET", DEFAULT_ASSET);
        let network = env::var("BATCHWITHDRAW_NETWORK")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let input = match env::var("BATCHWITHDRAW_INPUT") {
            Ok(path) if !path.trim().is_empty() => fs::read_to_string(&path)
                .with_context(|| format!("failed to read input file '{path}'"))?,
            _ => SAMPLE_INPUT.to_string(),
        };
        let available_balance =
            parse_env_with_default("BATCHWITHDRAW_BALANCE", Decimal::from(DEFAULT_BALANCE))?;
        let exchange_balance =
            parse_env_with_default("BATCHWITHDRAW_EXCHANGE_BALANCE", available_balance)?;
        let fee = parse_env_with_default("BATCHWITHDRAW_FEE", Decimal::ZERO)?;
        let min_delay_secs =
            parse_env_with_default::<u64>("BATCHWITHDRAW_MIN_DELAY", DEFAULT_MIN_DELAY_SECS)?;
        let max_delay_secs =
            parse_env_with_default::<u64>("BATCHWITHDRAW_MAX_DELAY", DEFAULT_MAX_DELAY_SECS)?;
        let strict_addresses = parse_env_with_default::<bool>("BATCHWITHDRAW_STRICT", false)?;

        let random_range = match (
            env::var("BATCHWITHDRAW_RANDOM_MIN").ok(),
            env::var("BATCHWITHDRAW_RANDOM_MAX").ok(),
        ) {
            (Some(min), Some(max)) => Some((
                Decimal::from_str(min.trim())
                    .with_context(|| format!("failed to parse BATCHWITHDRAW_RANDOM_MIN='{min}'"))?,
                Decimal::from_str(max.trim())
                    .with_context(|| format!("failed to parse BATCHWITHDRAW_RANDOM_MAX='{max}'"))?,
                parse_env_with_default::<u32>("BATCHWITHDRAW_RANDOM_DECIMALS", DEFAULT_DECIMALS)?,
            )),
            _ => None,
        };

        ensure!(
            !fee.is_sign_negative(),
            "BATCHWITHDRAW_FEE must not be negative"
        );

        Ok(Self {
            asset,
            network,
            input,
            available_balance,
            exchange_balance,
            fee,
            min_delay_secs,
            max_delay_secs,
            strict_addresses,
            random_range,
        })
    }

    fn to_job(&self) -> Result<BatchJob> {
        let input = match self.random_range {
            Some((min, max, decimals)) => {
                randomize_amounts(&self.input, min, max, decimals, &mut rand::thread_rng())?
            }
            None => self.input.clone(),
        };

        let policy = if self.strict_addresses {
            AddressPolicy::Strict
        } else {
            AddressPolicy::Lenient
        };

        let mut builder = BatchJob::builder()
            .asset(self.asset.clone())
            .input(&input)
            .delay_secs(self.min_delay_secs, self.max_delay_secs)
            .available_balance(self.available_balance)
            .address_policy(policy)
            .report_skipped(true);
        if let Some(network) = &self.network {
            builder = builder.network(network.clone());
        }
        builder.build()
    }
}

fn read_env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env_with_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}='{value}'")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
    }
}
