use super::ValidationError;
use rust_decimal::Decimal;

/// Smallest amount accepted for any asset (0.0001).
pub const MIN_WITHDRAWAL_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Checks `amount` against the running balance and the withdrawal floor.
///
/// Order matters: non-positive first, then balance, then the minimum.
pub fn validate_amount(
    amount: Decimal,
    available: Decimal,
    asset: &str,
) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }

    if amount > available {
        return Err(ValidationError::InsufficientBalance {
            requested: amount,
            available,
        });
    }

    if amount < MIN_WITHDRAWAL_AMOUNT {
        return Err(ValidationError::BelowMinimum {
            minimum: MIN_WITHDRAWAL_AMOUNT,
            asset: asset.to_owned(),
        });
    }

    Ok(())
}
