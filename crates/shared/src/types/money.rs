//! Monetary amount helpers with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` with cent (2 dp) precision.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// ISO 4217 code of the single ledger currency.
pub const CURRENCY: &str = "EUR";

/// Errors for malformed monetary amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Amount must be strictly positive.
    #[error("Amount must be positive")]
    NotPositive,

    /// Amount carries sub-cent precision.
    #[error("Amount has more than two decimal places")]
    SubCentPrecision,
}

/// Validates a user-supplied movement amount.
///
/// Amounts must be strictly positive and expressible in whole cents.
///
/// # Errors
///
/// Returns an error if the amount is zero, negative, or has sub-cent digits.
pub fn validate_amount(amount: Decimal) -> Result<(), AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    if amount.normalize().scale() > 2 {
        return Err(AmountError::SubCentPrecision);
    }
    Ok(())
}

/// Rounds an amount to cents using Banker's Rounding.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Formats an amount for user-facing text, e.g. `"120.50 EUR"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2} {CURRENCY}", round_cents(amount))
}
