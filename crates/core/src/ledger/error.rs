//! Error types for ledger rule violations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the pure ledger rules.
///
/// Storage-level failures (missing rows, contention) are reported by the
/// repository layer; this enum only covers business rule violations that
/// can be decided from values alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A debit would take the balance below zero and overdraft is disallowed.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the attempted debit.
        balance: Decimal,
        /// Amount the debit asked for.
        requested: Decimal,
    },

    /// The daily transfer cap would be exceeded.
    #[error("Daily transfer limit exceeded: limit {limit}, attempted {attempted}")]
    DailyLimitExceeded {
        /// Configured daily maximum.
        limit: Decimal,
        /// Day total including the attempted transfer.
        attempted: Decimal,
    },

    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SelfTransfer,
}
