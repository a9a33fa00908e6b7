//! Initial database migration.
//!
//! Creates the enum types, core tables, and indexes for the ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CORE TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: COLLABORATOR SINKS
        // ============================================================
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 4: INDEXES
        // ============================================================
        db.execute_unprepared(INDEXES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account types
CREATE TYPE account_type AS ENUM (
    'current',
    'savings'
);

-- Transaction types. The debit side of a transfer is 'transfer';
-- credit sides are posted as 'deposit'.
CREATE TYPE transaction_type AS ENUM (
    'deposit',
    'withdrawal',
    'transfer'
);

-- Transaction statuses
CREATE TYPE transaction_status AS ENUM (
    'pending',
    'completed'
);

-- User roles
CREATE TYPE user_role AS ENUM (
    'user',
    'admin'
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'user',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const ACCOUNTS_SQL: &str = r#"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    "type" account_type NOT NULL DEFAULT 'current',
    label VARCHAR(255) NOT NULL,
    balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    account_number VARCHAR(34) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

const TRANSACTIONS_SQL: &str = r#"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    related_account_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
    "type" transaction_type NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    balance_before NUMERIC(15, 2) NOT NULL,
    balance_after NUMERIC(15, 2) NOT NULL,
    status transaction_status NOT NULL DEFAULT 'completed',
    description VARCHAR(500),
    counterparty_email VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind VARCHAR(64) NOT NULL,
    title VARCHAR(255) NOT NULL,
    body TEXT NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}',
    read_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    user_id UUID REFERENCES users(id) ON DELETE SET NULL,
    action VARCHAR(64) NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}',
    ip_address VARCHAR(45),
    user_agent VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const INDEXES_SQL: &str = r#"
-- Account listing per user
CREATE INDEX idx_accounts_user_id ON accounts(user_id);

-- Transaction history per account, newest first
CREATE INDEX idx_transactions_account_created ON transactions(account_id, created_at DESC);

-- Daily-limit sum: outgoing transfers per account per day
CREATE INDEX idx_transactions_account_type_created ON transactions(account_id, "type", created_at);

-- Pending settlement lookup by recipient email
CREATE INDEX idx_transactions_pending_email
    ON transactions(counterparty_email, status)
    WHERE counterparty_email IS NOT NULL;

-- Notification feed per user
CREATE INDEX idx_notifications_user_created ON notifications(user_id, created_at DESC);

-- Audit trail per user
CREATE INDEX idx_audit_logs_user_created ON audit_logs(user_id, created_at DESC);
"#;

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS user_role;
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS account_type;
";
