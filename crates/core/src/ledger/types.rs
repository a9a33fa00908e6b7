//! Domain types for transfer requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a transfer names its destination.
///
/// Account ids and account numbers must resolve to an existing account;
/// an email destination that does not resolve defers the transfer instead
/// of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDestination {
    /// Explicit account id.
    AccountId(Uuid),
    /// Explicit account number (whitespace-insensitive).
    AccountNumber(String),
    /// Recipient email address; resolved to the user's oldest current
    /// account, or deferred when no account exists.
    Email(String),
}

impl std::fmt::Display for TransferDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountId(id) => write!(f, "account {id}"),
            Self::AccountNumber(number) => write!(f, "account number {number}"),
            Self::Email(email) => write!(f, "email {email}"),
        }
    }
}
