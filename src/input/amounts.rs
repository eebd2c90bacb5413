use anyhow::{bail, Context, Result};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Largest number of fractional digits accepted for generated amounts.
pub const MAX_AMOUNT_DECIMALS: u32 = 8;

/// Rewrites the amount column of an address list with random values.
///
/// Every non-blank line keeps its address (first comma-separated field) and
/// receives an amount drawn uniformly from `[min, max)` on a grid of
/// `decimals` fractional digits. Lines with a blank address are dropped.
pub fn randomize_amounts<R: Rng + ?Sized>(
    raw_text: &str,
    min: Decimal,
    max: Decimal,
    decimals: u32,
    rng: &mut R,
) -> Result<String> {
    if min.is_sign_negative() || max.is_sign_negative() {
        bail!("amount range must not be negative (got {min}..{max})");
    }
    if min >= max {
        bail!("minimum amount {min} must be lower than maximum amount {max}");
    }
    if decimals > MAX_AMOUNT_DECIMALS {
        bail!("decimals must be at most {MAX_AMOUNT_DECIMALS} (got {decimals})");
    }

    let (low, high) = unit_bounds(min, max, decimals)?;

    let lines: Vec<String> = raw_text
        .lines()
        .filter_map(|line| {
            let address = line.split(',').next().unwrap_or_default().trim();
            if address.is_empty() {
                return None;
            }
            let units = rng.gen_range(low..high);
            Some(format!("{address},{}", Decimal::new(units, decimals)))
        })
        .collect();

    if lines.is_empty() {
        bail!("address list contains no addresses");
    }

    Ok(lines.join("\n"))
}

/// Converts the decimal range into integer units of `10^-decimals`.
fn unit_bounds(min: Decimal, max: Decimal, decimals: u32) -> Result<(i64, i64)> {
    let scale = Decimal::from(10u64.pow(decimals));
    let low = min
        .checked_mul(scale)
        .context("minimum amount is too large")?
        .ceil()
        .to_i64()
        .context("minimum amount is too large")?;
    let high = max
        .checked_mul(scale)
        .context("maximum amount is too large")?
        .ceil()
        .to_i64()
        .context("maximum amount is too large")?;

    if high <= low {
        bail!("range {min}..{max} holds no value with {decimals} decimal(s)");
    }
    Ok((low, high))
}
