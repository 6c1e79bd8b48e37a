//! Fixed-point money amounts.
//!
//! Amounts are stored and computed as whole minor units (`u64`, two decimal
//! places). Decimal text only appears at the CLI boundary.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use thiserror::Error;

/// Decimal places in a major unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amount cannot be negative: {0}")]
    Negative(String),

    #[error("amount has more than {MINOR_UNIT_SCALE} decimal places: {0}")]
    TooPrecise(String),

    #[error("amount is too large: {0}")]
    OutOfRange(String),
}

/// Parse a decimal amount such as `"12.50"` into minor units.
///
/// # Errors
///
/// Returns an error when the text is not a number, is negative, would lose
/// precision, or does not fit in the ledger's amount range.
pub fn parse_amount(text: &str) -> Result<u64, MoneyError> {
    let trimmed = text.trim();

    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|_err| MoneyError::Invalid(trimmed.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(trimmed.to_string()));
    }

    if amount.normalize().scale() > MINOR_UNIT_SCALE {
        return Err(MoneyError::TooPrecise(trimmed.to_string()));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .and_then(|minor| u64::try_from(minor).ok())
        .ok_or_else(|| MoneyError::OutOfRange(trimmed.to_string()))
}

/// Render minor units as a decimal amount with two places.
#[must_use]
pub fn format_amount(minor: u64) -> String {
    Decimal::from_i128_with_scale(i128::from(minor), MINOR_UNIT_SCALE).to_string()
}
