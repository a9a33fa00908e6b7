//! Shared fixture for integration tests.
//!
//! Tests run against a live PostgreSQL pointed at by `DATABASE_URL` and
//! skip (with a notice) when it is unset. Migrations are applied on
//! setup; every test creates its own users and accounts, so tests can
//! run concurrently against the same database.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::env;
use tokio::sync::OnceCell;
use uuid::Uuid;

use centime_db::entities::{accounts, sea_orm_active_enums::{AccountType, UserRole}, users};
use centime_db::migration::{Migrator, MigratorTrait};
use centime_db::repositories::{
    AccountRepository, AuditLogRepository, NotificationRepository, SourceContext,
    TransactionRepository, UserRepository,
};
use centime_shared::config::LedgerConfig;

/// Everything a test needs to drive the ledger.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub users: UserRepository,
    pub accounts: AccountRepository,
    pub ledger: TransactionRepository,
    pub source: SourceContext,
}

/// Connects and migrates, or returns `None` when no database is
/// configured (the test should return early).
pub async fn setup() -> Option<TestContext> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let db = centime_db::connect(&url)
        .await
        .expect("failed to connect to test database");

    // Tests in one binary run in parallel; migrate exactly once.
    static MIGRATED: OnceCell<()> = OnceCell::const_new();
    MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None)
                .await
                .expect("failed to run migrations");
        })
        .await;

    let audit = AuditLogRepository::new(db.clone());
    Some(TestContext {
        users: UserRepository::new(db.clone()),
        accounts: AccountRepository::new(db.clone(), audit.clone()),
        ledger: ledger_with(&db, LedgerConfig::default()),
        source: SourceContext::default(),
        db,
    })
}

/// Builds a transaction repository with a specific ledger config
/// (custom daily cap, overdraft, ...).
pub fn ledger_with(db: &DatabaseConnection, config: LedgerConfig) -> TransactionRepository {
    TransactionRepository::new(
        db.clone(),
        config,
        NotificationRepository::new(db.clone()),
        AuditLogRepository::new(db.clone()),
        None,
    )
}

impl TestContext {
    /// Creates a user with a unique email.
    pub async fn create_user(&self) -> users::Model {
        self.users
            .create(
                &format!("{}@test.centime.dev", Uuid::new_v4()),
                "test-hash",
                "Test User",
                UserRole::User,
            )
            .await
            .expect("failed to create test user")
    }

    /// Opens a current account for a user.
    pub async fn create_account(&self, user: &users::Model) -> accounts::Model {
        self.accounts
            .create_account(user.id, AccountType::Current, None, &self.source)
            .await
            .expect("failed to create test account")
    }

    /// Opens a savings account for a user.
    pub async fn create_savings_account(&self, user: &users::Model) -> accounts::Model {
        self.accounts
            .create_account(user.id, AccountType::Savings, None, &self.source)
            .await
            .expect("failed to create test account")
    }

    /// Deposits into an account to give the test something to move.
    pub async fn fund(&self, account: &accounts::Model, user: &users::Model, amount: Decimal) {
        self.ledger
            .deposit(account.id, user.id, amount, None, &self.source)
            .await
            .expect("failed to fund test account");
    }

    /// Re-reads an account's current balance.
    pub async fn balance_of(&self, account_id: Uuid) -> Decimal {
        self.accounts
            .find_by_id(account_id)
            .await
            .expect("failed to re-read account")
            .expect("account disappeared")
            .balance
    }
}
