//! Ledger posting rules.
//!
//! This module implements the pure core of the ledger:
//! - Movement planning (balance snapshots, overdraft rule)
//! - Daily transfer limit checks
//! - Account number generation and normalization
//! - Domain types for transfer destinations
//! - Error types for rule violations

pub mod account_number;
pub mod error;
pub mod limits;
pub mod posting;
pub mod types;

#[cfg(test)]
mod posting_props;

pub use account_number::{generate_account_number, normalize_account_number};
pub use error::LedgerError;
pub use limits::check_daily_limit;
pub use posting::{MovementPlan, plan_movement};
pub use types::TransferDestination;
