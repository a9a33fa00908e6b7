//! Movement planning: balance snapshots and the overdraft rule.
//!
//! Every balance mutation goes through [`plan_movement`] while the caller
//! holds an exclusive lock on the account row. The plan carries the
//! `balance_before`/`balance_after` snapshots that are persisted verbatim
//! on the transaction row.

use rust_decimal::Decimal;

use super::error::LedgerError;

/// The computed outcome of a single balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementPlan {
    /// Balance read under lock, before the movement.
    pub balance_before: Decimal,
    /// Balance after applying the signed amount.
    pub balance_after: Decimal,
}

impl MovementPlan {
    /// The signed amount this plan applies.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.balance_after - self.balance_before
    }
}

/// Plans a movement against a balance read under lock.
///
/// `signed_amount` is positive for a credit, negative for a debit. A debit
/// that would take the balance below zero fails with
/// [`LedgerError::InsufficientFunds`] unless overdraft is allowed; a credit
/// never fails, even on an already-negative balance.
///
/// # Errors
///
/// Returns `InsufficientFunds` when the debit is not covered.
pub fn plan_movement(
    balance: Decimal,
    signed_amount: Decimal,
    allow_overdraft: bool,
) -> Result<MovementPlan, LedgerError> {
    let balance_after = balance + signed_amount;

    if signed_amount < Decimal::ZERO && balance_after < Decimal::ZERO && !allow_overdraft {
        return Err(LedgerError::InsufficientFunds {
            balance,
            requested: -signed_amount,
        });
    }

    Ok(MovementPlan {
        balance_before: balance,
        balance_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_credit_produces_snapshots() {
        let plan = plan_movement(dec!(100), dec!(50), false).unwrap();
        assert_eq!(plan.balance_before, dec!(100));
        assert_eq!(plan.balance_after, dec!(150));
        assert_eq!(plan.signed_amount(), dec!(50));
    }

    #[test]
    fn test_debit_within_balance() {
        let plan = plan_movement(dec!(100), dec!(-30), false).unwrap();
        assert_eq!(plan.balance_after, dec!(70));
    }

    #[test]
    fn test_debit_to_exactly_zero() {
        let plan = plan_movement(dec!(20), dec!(-20), false).unwrap();
        assert_eq!(plan.balance_after, dec!(0));
    }

    #[test]
    fn test_uncovered_debit_rejected() {
        let err = plan_movement(dec!(20), dec!(-50), false).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: dec!(20),
                requested: dec!(50),
            }
        );
    }

    #[test]
    fn test_uncovered_debit_allowed_with_overdraft() {
        let plan = plan_movement(dec!(20), dec!(-50), true).unwrap();
        assert_eq!(plan.balance_after, dec!(-30));
    }

    #[test]
    fn test_credit_on_negative_balance_always_allowed() {
        // An account already in overdraft can always be credited.
        let plan = plan_movement(dec!(-30), dec!(10), false).unwrap();
        assert_eq!(plan.balance_after, dec!(-20));
    }
}
