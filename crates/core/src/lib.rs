//! Core ledger business rules for Centime.
//!
//! This crate contains the pure decision logic behind every balance
//! mutation: posting math with balance snapshots, the daily transfer
//! limit, and account number generation. It has no database or IO
//! dependencies; the `centime-db` repositories call into it from inside
//! their storage transactions.

pub mod ledger;
