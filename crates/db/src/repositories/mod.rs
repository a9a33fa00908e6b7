//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. `TransactionRepository` is the ledger consistency core;
//! the notification and audit repositories are fire-and-forget sinks.

pub mod account;
pub mod audit;
pub mod notification;
pub mod transaction;
pub mod user;

pub use account::{AccountError, AccountRepository, UpdateAccountInput};
pub use audit::{AuditLogRepository, SourceContext};
pub use notification::NotificationRepository;
pub use transaction::{
    AdminTransferOutcome, MovementReceipt, SettlementFailure, SettlementReport, TransactionError,
    TransactionFilter, TransactionRepository, TransferOutcome, TransferRequest,
};
pub use user::UserRepository;
