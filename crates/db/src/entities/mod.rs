//! `SeaORM` entity definitions for the ledger tables.

pub mod accounts;
pub mod audit_logs;
pub mod notifications;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
