//! Shared types, errors, and configuration for Centime.
//!
//! This crate provides common pieces used across all other crates:
//! - Amount helpers with decimal precision
//! - Pagination types for list operations
//! - Application-wide error types
//! - Configuration management
//! - Transactional email (deferred-transfer notices)

pub mod config;
pub mod email;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
