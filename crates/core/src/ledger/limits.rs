//! Daily transfer limit enforcement.

use rust_decimal::Decimal;

use super::error::LedgerError;

/// Checks a new transfer against the daily cap.
///
/// `day_total` is the sum of the account's outgoing transfer amounts for
/// the current calendar day (pending and completed; a deferred transfer
/// has already moved the sender's money today). Reaching the cap exactly
/// is allowed; crossing it is not.
///
/// # Errors
///
/// Returns `DailyLimitExceeded` when `day_total + amount > limit`.
pub fn check_daily_limit(
    day_total: Decimal,
    amount: Decimal,
    limit: Decimal,
) -> Result<(), LedgerError> {
    let attempted = day_total + amount;
    if attempted > limit {
        return Err(LedgerError::DailyLimitExceeded { limit, attempted });
    }
    Ok(())
}
