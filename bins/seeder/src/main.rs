//! Database seeder for Centime development and testing.
//!
//! Seeds two demo users with accounts and a few ledger movements,
//! including one deferred transfer awaiting settlement.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use centime_core::ledger::TransferDestination;
use centime_db::entities::{
    sea_orm_active_enums::{AccountType, UserRole},
    users,
};
use centime_db::repositories::{
    AccountRepository, AuditLogRepository, NotificationRepository, SourceContext,
    TransactionRepository, TransferRequest,
};
use centime_shared::config::LedgerConfig;

/// Demo user IDs (consistent for all seeds)
const ALICE_ID: &str = "00000000-0000-0000-0000-000000000001";
const BOB_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Placeholder hash; authentication is handled outside this repository.
const DEV_PASSWORD_HASH: &str = "$argon2id$dev-only$not-a-real-hash";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = centime_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if users::Entity::find_by_id(alice_id())
        .one(&db)
        .await
        .expect("Failed to query users")
        .is_some()
    {
        println!("Seed data already present, nothing to do.");
        return;
    }

    println!("Seeding demo users...");
    seed_users(&db).await;

    println!("Seeding accounts and movements...");
    seed_ledger(&db).await;

    println!("Seeding complete!");
}

fn alice_id() -> Uuid {
    Uuid::parse_str(ALICE_ID).unwrap()
}

fn bob_id() -> Uuid {
    Uuid::parse_str(BOB_ID).unwrap()
}

/// Seeds the demo users with fixed IDs.
async fn seed_users(db: &DatabaseConnection) {
    let now = chrono::Utc::now().into();

    users::ActiveModel {
        id: Set(alice_id()),
        email: Set("alice@centime.dev".to_string()),
        password_hash: Set(DEV_PASSWORD_HASH.to_string()),
        full_name: Set("Alice Martin".to_string()),
        role: Set(UserRole::User),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed alice");

    users::ActiveModel {
        id: Set(bob_id()),
        email: Set("bob@centime.dev".to_string()),
        password_hash: Set(DEV_PASSWORD_HASH.to_string()),
        full_name: Set("Bob Durand".to_string()),
        role: Set(UserRole::Admin),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed bob");
}

/// Opens accounts and posts a few movements through the repositories.
async fn seed_ledger(db: &DatabaseConnection) {
    let audit = AuditLogRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone(), audit.clone());
    let ledger = TransactionRepository::new(
        db.clone(),
        LedgerConfig::default(),
        NotificationRepository::new(db.clone()),
        audit,
        None,
    );
    let source = SourceContext::default();

    let alice_current = accounts
        .create_account(alice_id(), AccountType::Current, None, &source)
        .await
        .expect("Failed to create alice's current account");
    let bob_current = accounts
        .create_account(bob_id(), AccountType::Current, None, &source)
        .await
        .expect("Failed to create bob's current account");

    ledger
        .deposit(
            alice_current.id,
            alice_id(),
            Decimal::new(100_000, 2), // 1000.00
            Some("Opening deposit".to_string()),
            &source,
        )
        .await
        .expect("Failed to seed deposit");

    ledger
        .transfer(
            alice_id(),
            TransferRequest {
                from_account_id: alice_current.id,
                destination: TransferDestination::AccountId(bob_current.id),
                amount: Decimal::new(12_050, 2), // 120.50
                description: Some("Lunch money".to_string()),
            },
            &source,
        )
        .await
        .expect("Failed to seed transfer");

    // A transfer to an email with no account yet: stays pending until
    // someone registers with it and settlement runs.
    ledger
        .transfer(
            alice_id(),
            TransferRequest {
                from_account_id: alice_current.id,
                destination: TransferDestination::Email("carol@centime.dev".to_string()),
                amount: Decimal::new(3_000, 2), // 30.00
                description: Some("Welcome gift".to_string()),
            },
            &source,
        )
        .await
        .expect("Failed to seed deferred transfer");

    println!(
        "  alice: current account {} ({})",
        alice_current.id, alice_current.account_number
    );
    println!(
        "  bob:   current account {} ({})",
        bob_current.id, bob_current.account_number
    );
}
