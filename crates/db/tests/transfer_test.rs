//! Integration tests for the transfer engine.
//!
//! Covers immediate settlement by account id, account number, and email;
//! conservation across the row pair; the daily limit; and destination
//! errors.

mod common;

use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use centime_core::ledger::TransferDestination;
use centime_db::entities::{
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    transactions,
};
use centime_db::repositories::{TransactionError, TransferRequest};
use centime_shared::config::LedgerConfig;

fn request(from: uuid::Uuid, destination: TransferDestination, amount: rust_decimal::Decimal) -> TransferRequest {
    TransferRequest {
        from_account_id: from,
        destination,
        amount,
        description: Some("integration test".into()),
    }
}

#[tokio::test]
async fn immediate_transfer_by_account_id_writes_linked_pair() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let bob = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    let to = ctx.create_account(&bob).await;
    ctx.fund(&from, &alice, dec!(100)).await;

    let outcome = ctx
        .ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::AccountId(to.id), dec!(30)),
            &ctx.source,
        )
        .await
        .unwrap();

    assert!(!outcome.deferred);
    assert_eq!(outcome.balance_after, dec!(70));
    assert_eq!(ctx.balance_of(to.id).await, dec!(30));

    let debit = transactions::Entity::find_by_id(outcome.transaction_id)
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();
    let credit = transactions::Entity::find_by_id(outcome.related_transaction_id.unwrap())
        .one(&ctx.db)
        .await
        .unwrap()
        .unwrap();

    // Linked pair, both completed.
    assert_eq!(debit.transaction_type, TransactionType::Transfer);
    assert_eq!(debit.status, TransactionStatus::Completed);
    assert_eq!(debit.related_account_id, Some(to.id));
    assert_eq!(credit.status, TransactionStatus::Completed);
    assert_eq!(credit.related_account_id, Some(from.id));

    // Conservation: source delta + destination delta == 0.
    let source_delta = debit.balance_after - debit.balance_before;
    let dest_delta = credit.balance_after - credit.balance_before;
    assert_eq!(source_delta + dest_delta, dec!(0));
}

#[tokio::test]
async fn transfer_by_account_number_ignores_whitespace() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let bob = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    let to = ctx.create_account(&bob).await;
    ctx.fund(&from, &alice, dec!(50)).await;

    // Re-insert the display formatting a user would paste.
    let spaced: String = to
        .account_number
        .chars()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 4 == 0 {
                vec![' ', c]
            } else {
                vec![c]
            }
        })
        .collect();

    let outcome = ctx
        .ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::AccountNumber(spaced), dec!(25)),
            &ctx.source,
        )
        .await
        .unwrap();

    assert!(!outcome.deferred);
    assert_eq!(ctx.balance_of(to.id).await, dec!(25));
}

#[tokio::test]
async fn transfer_by_email_prefers_oldest_current_account() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let bob = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    // Savings first, then two current accounts; the older current one
    // must win.
    ctx.create_savings_account(&bob).await;
    let first_current = ctx.create_account(&bob).await;
    ctx.create_account(&bob).await;
    ctx.fund(&from, &alice, dec!(100)).await;

    let outcome = ctx
        .ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::Email(bob.email.clone()), dec!(40)),
            &ctx.source,
        )
        .await
        .unwrap();

    assert!(!outcome.deferred);
    assert_eq!(ctx.balance_of(first_current.id).await, dec!(40));
}

#[tokio::test]
async fn unknown_explicit_destination_fails() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    ctx.fund(&from, &alice, dec!(100)).await;

    let err = ctx
        .ledger
        .transfer(
            alice.id,
            request(
                from.id,
                TransferDestination::AccountId(uuid::Uuid::new_v4()),
                dec!(10),
            ),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::DestinationNotFound(_)));

    let err = ctx
        .ledger
        .transfer(
            alice.id,
            request(
                from.id,
                TransferDestination::AccountNumber("FR00DOESNOTEXIST".into()),
                dec!(10),
            ),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::DestinationNotFound(_)));

    // Nothing moved.
    assert_eq!(ctx.balance_of(from.id).await, dec!(100));
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    ctx.fund(&from, &alice, dec!(100)).await;

    let err = ctx
        .ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::AccountId(from.id), dec!(10)),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::SelfTransfer));

    let err = ctx
        .ledger
        .transfer(
            alice.id,
            request(
                from.id,
                TransferDestination::AccountNumber(from.account_number.clone()),
                dec!(10),
            ),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::SelfTransfer));
}

#[tokio::test]
async fn insufficient_funds_beats_destination_resolution() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    ctx.fund(&from, &alice, dec!(5)).await;

    // The destination does not exist either, but the funds check comes
    // first in the engine's state order.
    let err = ctx
        .ledger
        .transfer(
            alice.id,
            request(
                from.id,
                TransferDestination::AccountId(uuid::Uuid::new_v4()),
                dec!(10),
            ),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::InsufficientFunds { .. }));
}

#[tokio::test]
async fn daily_limit_allows_the_cap_and_rejects_crossing_it() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let bob = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    let to = ctx.create_account(&bob).await;
    ctx.fund(&from, &alice, dec!(1000)).await;

    let ledger = common::ledger_with(
        &ctx.db,
        LedgerConfig {
            max_daily_transfer: dec!(100),
            ..Default::default()
        },
    );

    // Several calls summing to exactly the cap.
    for amount in [dec!(40), dec!(35), dec!(25)] {
        ledger
            .transfer(
                alice.id,
                request(from.id, TransferDestination::AccountId(to.id), amount),
                &ctx.source,
            )
            .await
            .unwrap();
    }

    // Any further positive amount crosses the cap.
    let err = ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::AccountId(to.id), dec!(0.01)),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::DailyLimitExceeded { .. }));

    // Balances unchanged by the rejected request.
    assert_eq!(ctx.balance_of(from.id).await, dec!(900));
    assert_eq!(ctx.balance_of(to.id).await, dec!(100));
}

#[tokio::test]
async fn deferred_transfers_count_toward_the_daily_limit() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let alice = ctx.create_user().await;
    let from = ctx.create_account(&alice).await;
    ctx.fund(&from, &alice, dec!(500)).await;

    let ledger = common::ledger_with(
        &ctx.db,
        LedgerConfig {
            max_daily_transfer: dec!(100),
            ..Default::default()
        },
    );

    // A deferred transfer eats into the cap even though it is pending.
    let nobody = format!("{}@nowhere.centime.dev", uuid::Uuid::new_v4());
    ledger
        .transfer(
            alice.id,
            request(from.id, TransferDestination::Email(nobody), dec!(80)),
            &ctx.source,
        )
        .await
        .unwrap();

    let err = ledger
        .transfer(
            alice.id,
            request(
                from.id,
                TransferDestination::Email(format!(
                    "{}@nowhere.centime.dev",
                    uuid::Uuid::new_v4()
                )),
                dec!(30),
            ),
            &ctx.source,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::DailyLimitExceeded { .. }));
}
