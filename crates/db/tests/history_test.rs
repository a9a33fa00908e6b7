//! Integration tests for transaction history listing.

mod common;

use rust_decimal_macros::dec;

use centime_db::entities::sea_orm_active_enums::TransactionType;
use centime_db::repositories::TransactionFilter;
use centime_shared::types::PageRequest;

#[tokio::test]
async fn history_is_scoped_filtered_and_paginated() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let user = ctx.create_user().await;
    let other = ctx.create_user().await;
    let account = ctx.create_account(&user).await;
    let other_account = ctx.create_account(&other).await;

    for _ in 0..3 {
        ctx.fund(&account, &user, dec!(10)).await;
    }
    ctx.ledger
        .withdraw(account.id, user.id, dec!(5), None, &ctx.source)
        .await
        .unwrap();
    ctx.fund(&other_account, &other, dec!(99)).await;

    // All of the user's rows, nothing of the other user's.
    let all = ctx
        .ledger
        .list_transactions(user.id, TransactionFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 4);
    assert!(all.data.iter().all(|row| row.account_id == account.id));

    // Newest first.
    let newest = &all.data[0];
    assert_eq!(newest.transaction_type, TransactionType::Withdrawal);

    // Type filter.
    let deposits = ctx
        .ledger
        .list_transactions(
            user.id,
            TransactionFilter {
                transaction_type: Some(TransactionType::Deposit),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(deposits.meta.total, 3);

    // Pagination.
    let page = ctx
        .ledger
        .list_transactions(
            user.id,
            TransactionFilter::default(),
            &PageRequest { page: 2, per_page: 3 },
        )
        .await
        .unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test]
async fn single_row_lookup_respects_ownership() {
    let Some(ctx) = common::setup().await else {
        return;
    };
    let user = ctx.create_user().await;
    let stranger = ctx.create_user().await;
    let account = ctx.create_account(&user).await;

    let receipt = ctx
        .ledger
        .deposit(account.id, user.id, dec!(10), None, &ctx.source)
        .await
        .unwrap();

    let found = ctx
        .ledger
        .find_transaction(receipt.transaction_id, user.id)
        .await
        .unwrap();
    assert!(found.is_some());

    let hidden = ctx
        .ledger
        .find_transaction(receipt.transaction_id, stranger.id)
        .await
        .unwrap();
    assert!(hidden.is_none());
}
