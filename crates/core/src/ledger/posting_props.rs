//! Property tests for the posting and limit rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::limits::check_daily_limit;
use super::posting::plan_movement;

/// Strategy for non-negative balances, in cents.
fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for positive movement amounts, in cents.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For every accepted movement, `balance_after - balance_before`
    /// equals the signed amount exactly.
    #[test]
    fn prop_snapshot_correctness(
        balance in balance_strategy(),
        amount in amount_strategy(),
        credit in any::<bool>(),
        overdraft in any::<bool>(),
    ) {
        let signed = if credit { amount } else { -amount };
        if let Ok(plan) = plan_movement(balance, signed, overdraft) {
            prop_assert_eq!(plan.balance_after - plan.balance_before, signed);
            prop_assert_eq!(plan.balance_before, balance);
        }
    }

    /// Without overdraft, an accepted movement never leaves a
    /// non-negative balance negative.
    #[test]
    fn prop_no_negative_balance_without_overdraft(
        balance in balance_strategy(),
        amount in amount_strategy(),
        credit in any::<bool>(),
    ) {
        let signed = if credit { amount } else { -amount };
        if let Ok(plan) = plan_movement(balance, signed, false) {
            prop_assert!(plan.balance_after >= Decimal::ZERO);
        }
    }

    /// A credit is always accepted.
    #[test]
    fn prop_credit_never_fails(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        prop_assert!(plan_movement(balance, amount, false).is_ok());
    }

    /// With overdraft enabled, any debit is accepted.
    #[test]
    fn prop_overdraft_accepts_any_debit(
        balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        prop_assert!(plan_movement(balance, -amount, true).is_ok());
    }

    /// A transfer pairs a debit on the source with an equal credit on
    /// the destination; their deltas cancel exactly.
    #[test]
    fn prop_transfer_conservation(
        source_balance in balance_strategy(),
        dest_balance in balance_strategy(),
        amount in amount_strategy(),
    ) {
        prop_assume!(amount <= source_balance);
        let debit = plan_movement(source_balance, -amount, false).unwrap();
        let credit = plan_movement(dest_balance, amount, false).unwrap();
        prop_assert_eq!(debit.signed_amount() + credit.signed_amount(), Decimal::ZERO);
    }

    /// The daily limit accepts exactly the requests that keep the day
    /// total at or under the cap.
    #[test]
    fn prop_daily_limit_boundary(
        day_total in balance_strategy(),
        amount in amount_strategy(),
        limit in balance_strategy(),
    ) {
        let result = check_daily_limit(day_total, amount, limit);
        if day_total + amount <= limit {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err(), LedgerError::DailyLimitExceeded {
                limit,
                attempted: day_total + amount,
            });
        }
    }
}
