//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Everyday current account; default destination for email transfers.
    #[sea_orm(string_value = "current")]
    Current,
    /// Savings account.
    #[sea_orm(string_value = "savings")]
    Savings,
}

/// Transaction type.
///
/// The debit side of a transfer is posted as `Transfer`; every credit side
/// (immediate destination row, settlement credit, admin credit) is posted
/// as `Deposit`, so `Transfer` rows against an account are exactly its
/// outgoing transfer volume.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money in.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Money out at the counter.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Outgoing transfer debit.
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

/// Transaction status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Transfer admitted but recipient account unknown; money left the
    /// sender, nothing credited yet.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Movement fully applied; the row is immutable from here on.
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// User role.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular customer.
    #[sea_orm(string_value = "user")]
    User,
    /// Back-office administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
}
