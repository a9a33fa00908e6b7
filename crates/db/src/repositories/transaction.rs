//! Transaction repository: the ledger consistency core.
//!
//! Every balance mutation in the system goes through this repository. The
//! invariants it maintains:
//!
//! - An account balance is only ever read and written under an exclusive
//!   row lock (`SELECT ... FOR UPDATE`), inside one database transaction
//!   together with the transaction-row insert. Two movements against the
//!   same account serialize; movements against different accounts run in
//!   parallel.
//! - A transfer locks its source account before its destination account,
//!   always in that order.
//! - `balance_before`/`balance_after` snapshots are immutable once the row
//!   is `completed`.
//! - Bulk pending settlement is a sequence of independent database
//!   transactions: a failure on one item never rolls back the items
//!   settled before it, and the loop continues past it.
//!
//! Notifications, audit records, and deferred-transfer emails are
//! fire-and-forget: they run after commit and their failures are logged,
//! never surfaced.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

use centime_core::ledger::{
    self as rules, LedgerError as RuleError, TransferDestination, normalize_account_number,
};
use centime_shared::AppError;
use centime_shared::config::LedgerConfig;
use centime_shared::email::EmailService;
use centime_shared::types::money::{AmountError, format_amount, validate_amount};
use centime_shared::types::{PageRequest, PageResponse};

use crate::entities::{
    accounts,
    sea_orm_active_enums::{AccountType, TransactionStatus, TransactionType},
    transactions, users,
};
use crate::repositories::audit::{AuditLogRepository, SourceContext};
use crate::repositories::notification::NotificationRepository;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Account does not exist, or does not belong to the caller where
    /// ownership is required.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// User does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// A debit would take the balance below zero and overdraft is
    /// disallowed.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the attempted debit.
        balance: Decimal,
        /// Amount the debit asked for.
        requested: Decimal,
    },

    /// The daily transfer cap would be exceeded.
    #[error("Daily transfer limit exceeded: limit {limit}, attempted {attempted}")]
    DailyLimitExceeded {
        /// Configured daily maximum.
        limit: Decimal,
        /// Day total including the attempted transfer.
        attempted: Decimal,
    },

    /// Explicit account id / account number destination does not exist.
    /// Email destinations never raise this; they defer instead.
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    /// Pending transfer does not exist, is already settled, or is not
    /// addressed to the caller.
    #[error("Pending transfer not found: {0}")]
    TransferNotFound(Uuid),

    /// Settlement target account does not belong to the caller.
    #[error("Account {0} does not belong to the caller")]
    AccountOwnershipMismatch(Uuid),

    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SelfTransfer,

    /// Malformed amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Transient lock contention; safe to retry the whole operation.
    #[error("Storage busy, retry the operation")]
    StorageBusy,

    /// Database error.
    #[error("Database error: {0}")]
    Database(DbErr),
}

/// Deadlocks and lock timeouts are transient: the whole operation can be
/// retried from scratch by the caller.
fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("40P01")
        || message.contains("deadlock detected")
        || message.contains("lock timeout")
        || message.contains("canceling statement due to lock timeout")
}

impl From<DbErr> for TransactionError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            Self::StorageBusy
        } else {
            Self::Database(err)
        }
    }
}

impl From<RuleError> for TransactionError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::InsufficientFunds { balance, requested } => Self::InsufficientFunds {
                balance,
                requested,
            },
            RuleError::DailyLimitExceeded { limit, attempted } => Self::DailyLimitExceeded {
                limit,
                attempted,
            },
            RuleError::SelfTransfer => Self::SelfTransfer,
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::AccountNotFound(_)
            | TransactionError::UserNotFound(_)
            | TransactionError::DestinationNotFound(_)
            | TransactionError::TransferNotFound(_) => Self::NotFound(err.to_string()),
            TransactionError::AccountOwnershipMismatch(_) => Self::Forbidden(err.to_string()),
            TransactionError::InsufficientFunds { .. }
            | TransactionError::DailyLimitExceeded { .. } => Self::BusinessRule(err.to_string()),
            TransactionError::SelfTransfer | TransactionError::InvalidAmount(_) => {
                Self::Validation(err.to_string())
            }
            TransactionError::StorageBusy => Self::Busy(err.to_string()),
            TransactionError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// A transfer request against the engine.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Source account, owned by the caller.
    pub from_account_id: Uuid,
    /// Where the money goes.
    pub destination: TransferDestination,
    /// Positive amount in whole cents.
    pub amount: Decimal,
    /// Free-text description carried on both rows.
    pub description: Option<String>,
}

/// Result of a single balance movement.
#[derive(Debug, Clone, Copy)]
pub struct MovementReceipt {
    /// The inserted transaction row.
    pub transaction_id: Uuid,
    /// Account balance after the movement.
    pub balance_after: Decimal,
}

/// Result of a transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferOutcome {
    /// The debit row on the source account.
    pub transaction_id: Uuid,
    /// Source balance after the debit.
    pub balance_after: Decimal,
    /// The credit row on the destination, when settled immediately.
    pub related_transaction_id: Option<Uuid>,
    /// True when the destination was unresolved and the transfer is
    /// awaiting settlement.
    pub deferred: bool,
}

/// Result of an admin transfer.
#[derive(Debug, Clone, Copy)]
pub struct AdminTransferOutcome {
    /// Debit row on the source account.
    pub debit_transaction_id: Uuid,
    /// Credit row on the destination account.
    pub credit_transaction_id: Uuid,
    /// Source balance after.
    pub from_balance_after: Decimal,
    /// Destination balance after.
    pub to_balance_after: Decimal,
}

/// Per-item failure inside a bulk settlement run.
#[derive(Debug, Clone)]
pub struct SettlementFailure {
    /// The pending row that could not be settled.
    pub transaction_id: Uuid,
    /// Why.
    pub error: String,
}

/// Outcome of a bulk settlement run.
#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    /// Number of transfers settled.
    pub count: u32,
    /// Sum of the settled amounts.
    pub total_amount: Decimal,
    /// Items that failed; already-settled items are not rolled back.
    pub failures: Vec<SettlementFailure>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one account.
    pub account_id: Option<Uuid>,
    /// Restrict to one transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Rows created at or after this instant.
    pub date_from: Option<DateTime<Utc>>,
    /// Rows created at or before this instant.
    pub date_to: Option<DateTime<Utc>>,
}

/// One balance mutation to post against a locked account.
struct Movement {
    /// Positive for credit, negative for debit.
    signed_amount: Decimal,
    kind: TransactionType,
    status: TransactionStatus,
    description: Option<String>,
    related_account_id: Option<Uuid>,
    counterparty_email: Option<String>,
}

/// How a transfer destination resolved.
enum Resolution {
    /// Both accounts known: settle in one atomic step.
    Immediate(accounts::Model),
    /// Recipient unknown: defer with the email as the address.
    Deferred(String),
}

/// Transaction repository: balance movements, transfers, settlement.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
    notifications: NotificationRepository,
    audit: AuditLogRepository,
    mailer: Option<EmailService>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        config: LedgerConfig,
        notifications: NotificationRepository,
        audit: AuditLogRepository,
        mailer: Option<EmailService>,
    ) -> Self {
        Self {
            db,
            config,
            notifications,
            audit,
            mailer,
        }
    }

    // ========================================================================
    // Balance mutator
    // ========================================================================

    /// Posts one movement against an account the caller has locked.
    ///
    /// The account update and the row insert share the caller's database
    /// transaction; they commit together or not at all.
    async fn post_movement(
        &self,
        txn: &DatabaseTransaction,
        account: accounts::Model,
        movement: Movement,
    ) -> Result<transactions::Model, TransactionError> {
        let plan = rules::plan_movement(
            account.balance,
            movement.signed_amount,
            self.config.allow_overdraft,
        )?;

        let now = Utc::now().into();
        let account_id = account.id;

        let mut active: accounts::ActiveModel = account.into();
        active.balance = Set(plan.balance_after);
        active.updated_at = Set(now);
        active.update(txn).await?;

        let row = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            related_account_id: Set(movement.related_account_id),
            transaction_type: Set(movement.kind),
            amount: Set(movement.signed_amount.abs()),
            balance_before: Set(plan.balance_before),
            balance_after: Set(plan.balance_after),
            status: Set(movement.status),
            description: Set(movement.description),
            counterparty_email: Set(movement.counterparty_email),
            created_at: Set(now),
        };

        let row = row.insert(txn).await?;
        Ok(row)
    }

    /// Deposits into an owned account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `InvalidAmount`.
    pub async fn deposit(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
        source: &SourceContext,
    ) -> Result<MovementReceipt, TransactionError> {
        validate_amount(amount)?;

        let txn = self.db.begin().await?;
        let account = lock_owned_account(&txn, account_id, user_id).await?;
        let row = self
            .post_movement(
                &txn,
                account,
                Movement {
                    signed_amount: amount,
                    kind: TransactionType::Deposit,
                    status: TransactionStatus::Completed,
                    description,
                    related_account_id: None,
                    counterparty_email: None,
                },
            )
            .await?;
        txn.commit().await?;

        self.audit
            .record(
                Some(user_id),
                "deposit",
                serde_json::json!({
                    "accountId": account_id,
                    "amount": amount,
                    "transactionId": row.id,
                }),
                source,
            )
            .await;

        Ok(MovementReceipt {
            transaction_id: row.id,
            balance_after: row.balance_after,
        })
    }

    /// Withdraws from an owned account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAmount`, or `InsufficientFunds`;
    /// on failure no row is written and the balance is unchanged.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
        source: &SourceContext,
    ) -> Result<MovementReceipt, TransactionError> {
        validate_amount(amount)?;

        let txn = self.db.begin().await?;
        let account = lock_owned_account(&txn, account_id, user_id).await?;
        let row = self
            .post_movement(
                &txn,
                account,
                Movement {
                    signed_amount: -amount,
                    kind: TransactionType::Withdrawal,
                    status: TransactionStatus::Completed,
                    description,
                    related_account_id: None,
                    counterparty_email: None,
                },
            )
            .await?;
        txn.commit().await?;

        self.audit
            .record(
                Some(user_id),
                "withdrawal",
                serde_json::json!({
                    "accountId": account_id,
                    "amount": amount,
                    "transactionId": row.id,
                }),
                source,
            )
            .await;

        Ok(MovementReceipt {
            transaction_id: row.id,
            balance_after: row.balance_after,
        })
    }

    // ========================================================================
    // Transfer engine
    // ========================================================================

    /// Transfers money from an owned account to a destination resolved by
    /// account id, account number, or email.
    ///
    /// An email destination that does not resolve to an account defers the
    /// transfer: the source is debited, a single `pending` row carries the
    /// email, and settlement happens when the recipient opens an account
    /// or accepts the transfer explicitly.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAmount`, `InsufficientFunds`,
    /// `DailyLimitExceeded`, `DestinationNotFound` (explicit destinations
    /// only), or `SelfTransfer`.
    pub async fn transfer(
        &self,
        user_id: Uuid,
        request: TransferRequest,
        source: &SourceContext,
    ) -> Result<TransferOutcome, TransactionError> {
        validate_amount(request.amount)?;
        if let TransferDestination::AccountId(dest) = &request.destination
            && *dest == request.from_account_id
        {
            return Err(TransactionError::SelfTransfer);
        }

        let txn = self.db.begin().await?;

        // Source first, destination second; every transfer locks in this
        // order.
        let from_account = lock_owned_account(&txn, request.from_account_id, user_id).await?;

        // Funds check before destination resolution, per the engine's
        // state order. post_movement re-plans under the same lock.
        rules::plan_movement(
            from_account.balance,
            -request.amount,
            self.config.allow_overdraft,
        )?;

        let day_total =
            daily_transfer_total(&txn, from_account.id, Utc::now().date_naive()).await?;
        rules::check_daily_limit(day_total, request.amount, self.config.max_daily_transfer)?;

        let resolution = self
            .resolve_destination(&txn, &request.destination, from_account.id)
            .await?;

        let outcome = match resolution {
            Resolution::Immediate(dest_account) => {
                let dest_id = dest_account.id;
                let recipient_user_id = dest_account.user_id;

                let debit = self
                    .post_movement(
                        &txn,
                        from_account,
                        Movement {
                            signed_amount: -request.amount,
                            kind: TransactionType::Transfer,
                            status: TransactionStatus::Completed,
                            description: request.description.clone(),
                            related_account_id: Some(dest_id),
                            counterparty_email: None,
                        },
                    )
                    .await?;
                let credit = self
                    .post_movement(
                        &txn,
                        dest_account,
                        Movement {
                            signed_amount: request.amount,
                            kind: TransactionType::Deposit,
                            status: TransactionStatus::Completed,
                            description: request
                                .description
                                .clone()
                                .or_else(|| Some("Transfer received".to_string())),
                            related_account_id: Some(request.from_account_id),
                            counterparty_email: None,
                        },
                    )
                    .await?;
                txn.commit().await?;

                self.notifications
                    .notify(
                        recipient_user_id,
                        "transfer_received",
                        "Transfer received",
                        &format!("You received {}", format_amount(request.amount)),
                        serde_json::json!({
                            "transactionId": credit.id,
                            "amount": request.amount,
                            "fromAccountId": request.from_account_id,
                        }),
                    )
                    .await;

                TransferOutcome {
                    transaction_id: debit.id,
                    balance_after: debit.balance_after,
                    related_transaction_id: Some(credit.id),
                    deferred: false,
                }
            }
            Resolution::Deferred(email) => {
                let debit = self
                    .post_movement(
                        &txn,
                        from_account,
                        Movement {
                            signed_amount: -request.amount,
                            kind: TransactionType::Transfer,
                            status: TransactionStatus::Pending,
                            description: request.description.clone(),
                            related_account_id: None,
                            counterparty_email: Some(email.clone()),
                        },
                    )
                    .await?;
                txn.commit().await?;

                self.send_deferred_transfer_email(
                    user_id,
                    &email,
                    request.amount,
                    request.description.as_deref(),
                )
                .await;

                TransferOutcome {
                    transaction_id: debit.id,
                    balance_after: debit.balance_after,
                    related_transaction_id: None,
                    deferred: true,
                }
            }
        };

        self.audit
            .record(
                Some(user_id),
                "transfer",
                serde_json::json!({
                    "fromAccountId": request.from_account_id,
                    "destination": request.destination.to_string(),
                    "amount": request.amount,
                    "transactionId": outcome.transaction_id,
                    "deferred": outcome.deferred,
                }),
                source,
            )
            .await;

        let body = if outcome.deferred {
            format!(
                "Transfer of {} is pending: the recipient has no account yet",
                format_amount(request.amount)
            )
        } else {
            format!("Transfer of {} completed", format_amount(request.amount))
        };
        self.notifications
            .notify(
                user_id,
                "transfer_sent",
                "Transfer sent",
                &body,
                serde_json::json!({
                    "transactionId": outcome.transaction_id,
                    "amount": request.amount,
                }),
            )
            .await;

        Ok(outcome)
    }

    /// Resolves a transfer destination inside the engine's transaction,
    /// locking the destination account when one is found.
    async fn resolve_destination(
        &self,
        txn: &DatabaseTransaction,
        destination: &TransferDestination,
        from_account_id: Uuid,
    ) -> Result<Resolution, TransactionError> {
        match destination {
            TransferDestination::AccountId(id) => {
                let dest = accounts::Entity::find_by_id(*id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        TransactionError::DestinationNotFound(destination.to_string())
                    })?;
                Ok(Resolution::Immediate(dest))
            }
            TransferDestination::AccountNumber(number) => {
                let normalized = normalize_account_number(number);
                let dest = accounts::Entity::find()
                    .filter(accounts::Column::AccountNumber.eq(&normalized))
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        TransactionError::DestinationNotFound(destination.to_string())
                    })?;
                if dest.id == from_account_id {
                    return Err(TransactionError::SelfTransfer);
                }
                Ok(Resolution::Immediate(dest))
            }
            TransferDestination::Email(email) => {
                let user = users::Entity::find()
                    .filter(users::Column::Email.eq(email))
                    .one(txn)
                    .await?;
                let Some(user) = user else {
                    return Ok(Resolution::Deferred(email.clone()));
                };

                // Oldest current account wins; deterministic tie-break.
                let dest = accounts::Entity::find()
                    .filter(accounts::Column::UserId.eq(user.id))
                    .filter(accounts::Column::AccountType.eq(AccountType::Current))
                    .order_by_asc(accounts::Column::CreatedAt)
                    .lock_exclusive()
                    .one(txn)
                    .await?;
                match dest {
                    Some(dest) if dest.id == from_account_id => {
                        Err(TransactionError::SelfTransfer)
                    }
                    Some(dest) => Ok(Resolution::Immediate(dest)),
                    // User exists but owns no current account: defer.
                    None => Ok(Resolution::Deferred(email.clone())),
                }
            }
        }
    }

    /// Best-effort notice to an email address that money is waiting.
    async fn send_deferred_transfer_email(
        &self,
        sender_user_id: Uuid,
        to_email: &str,
        amount: Decimal,
        description: Option<&str>,
    ) {
        let Some(mailer) = &self.mailer else { return };

        let sender = users::Entity::find_by_id(sender_user_id)
            .one(&self.db)
            .await
            .ok()
            .flatten();
        let (sender_name, sender_email) =
            sender.map_or((None, None), |u| (Some(u.full_name), Some(u.email)));

        if let Err(err) = mailer
            .send_transfer_email(
                to_email,
                amount,
                description,
                sender_name.as_deref(),
                sender_email.as_deref(),
            )
            .await
        {
            tracing::warn!(to_email, error = %err, "failed to send deferred-transfer email");
        }
    }

    // ========================================================================
    // Admin transfer path
    // ========================================================================

    /// Moves money between any two accounts, bypassing ownership checks,
    /// the daily limit, and pending resolution. The overdraft rule still
    /// applies to the source.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `InvalidAmount`, `InsufficientFunds`, or
    /// `SelfTransfer`.
    pub async fn admin_transfer(
        &self,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: Decimal,
        description: Option<String>,
        acting_admin_id: Uuid,
        source: &SourceContext,
    ) -> Result<AdminTransferOutcome, TransactionError> {
        validate_amount(amount)?;
        if from_account_id == to_account_id {
            return Err(TransactionError::SelfTransfer);
        }

        let txn = self.db.begin().await?;
        let from_account = lock_account(&txn, from_account_id).await?;
        let to_account = lock_account(&txn, to_account_id).await?;
        let from_user_id = from_account.user_id;
        let to_user_id = to_account.user_id;

        let debit = self
            .post_movement(
                &txn,
                from_account,
                Movement {
                    signed_amount: -amount,
                    kind: TransactionType::Transfer,
                    status: TransactionStatus::Completed,
                    description: description
                        .clone()
                        .or_else(|| Some(format!("Admin transfer to account {to_account_id}"))),
                    related_account_id: Some(to_account_id),
                    counterparty_email: None,
                },
            )
            .await?;
        let credit = self
            .post_movement(
                &txn,
                to_account,
                Movement {
                    signed_amount: amount,
                    kind: TransactionType::Deposit,
                    status: TransactionStatus::Completed,
                    description: description
                        .or_else(|| Some(format!("Admin transfer from account {from_account_id}"))),
                    related_account_id: Some(from_account_id),
                    counterparty_email: None,
                },
            )
            .await?;
        txn.commit().await?;

        // Distinguishable from a user-initiated "transfer" action.
        self.audit
            .record(
                Some(acting_admin_id),
                "admin_transfer",
                serde_json::json!({
                    "fromAccountId": from_account_id,
                    "toAccountId": to_account_id,
                    "amount": amount,
                    "debitTransactionId": debit.id,
                    "creditTransactionId": credit.id,
                }),
                source,
            )
            .await;

        self.notifications
            .notify(
                from_user_id,
                "admin_transfer",
                "Administrative transfer",
                &format!(
                    "A transfer of {} was made from your account",
                    format_amount(amount)
                ),
                serde_json::json!({ "transactionId": debit.id, "amount": amount }),
            )
            .await;
        self.notifications
            .notify(
                to_user_id,
                "admin_transfer",
                "Administrative transfer",
                &format!(
                    "A transfer of {} was made to your account",
                    format_amount(amount)
                ),
                serde_json::json!({ "transactionId": credit.id, "amount": amount }),
            )
            .await;

        Ok(AdminTransferOutcome {
            debit_transaction_id: debit.id,
            credit_transaction_id: credit.id,
            from_balance_after: debit.balance_after,
            to_balance_after: credit.balance_after,
        })
    }

    // ========================================================================
    // Pending-transfer resolver
    // ========================================================================

    /// Accepts one pending transfer into an owned account.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `TransferNotFound` (already settled or not
    /// addressed to the caller), `AccountNotFound`, or
    /// `AccountOwnershipMismatch`.
    pub async fn accept_pending_transfer(
        &self,
        transaction_id: Uuid,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<MovementReceipt, TransactionError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::UserNotFound(user_id))?;

        let txn = self.db.begin().await?;

        let pending = transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .filter(transactions::Column::TransactionType.eq(TransactionType::Transfer))
            .filter(transactions::Column::RelatedAccountId.is_null())
            .filter(transactions::Column::CounterpartyEmail.eq(&user.email))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TransactionError::TransferNotFound(transaction_id))?;

        let dest = lock_account(&txn, account_id).await?;
        if dest.user_id != user_id {
            return Err(TransactionError::AccountOwnershipMismatch(account_id));
        }

        let credit = self.settle_into(&txn, &pending, dest).await?;
        txn.commit().await?;

        self.notify_sender_settled(&pending, &user.email, "accepted").await;
        self.notifications
            .notify(
                user_id,
                "transfer_accepted",
                "Transfer accepted",
                &format!(
                    "You accepted a transfer of {}",
                    format_amount(pending.amount)
                ),
                serde_json::json!({
                    "transactionId": transaction_id,
                    "accountId": account_id,
                    "amount": pending.amount,
                }),
            )
            .await;

        Ok(MovementReceipt {
            transaction_id: credit.id,
            balance_after: credit.balance_after,
        })
    }

    /// Settles every pending transfer addressed to a user's email into one
    /// of their accounts, earliest first.
    ///
    /// Each item settles in its own database transaction: a failure on one
    /// item is reported and the loop continues, without rolling back the
    /// items already settled.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `AccountNotFound`, or
    /// `AccountOwnershipMismatch` when the destination is invalid; per-item
    /// failures are collected in the report instead.
    pub async fn settle_pending_transfers(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<SettlementReport, TransactionError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::UserNotFound(user_id))?;

        let dest = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::AccountNotFound(account_id))?;
        if dest.user_id != user_id {
            return Err(TransactionError::AccountOwnershipMismatch(account_id));
        }

        // Earliest transfers settle first.
        let pending_ids: Vec<Uuid> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Id)
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .filter(transactions::Column::TransactionType.eq(TransactionType::Transfer))
            .filter(transactions::Column::RelatedAccountId.is_null())
            .filter(transactions::Column::CounterpartyEmail.eq(&user.email))
            .order_by_asc(transactions::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await?;

        tracing::info!(
            %user_id,
            %account_id,
            pending = pending_ids.len(),
            "settling pending transfers"
        );

        let mut report = SettlementReport::default();
        for pending_id in pending_ids {
            match self.settle_one(pending_id, account_id, &user.email).await {
                Ok(Some(pending)) => {
                    report.count += 1;
                    report.total_amount += pending.amount;
                    self.notify_sender_settled(&pending, &user.email, "completed")
                        .await;
                }
                // Raced with an explicit acceptance; nothing left to do.
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%pending_id, error = %err, "failed to settle pending transfer");
                    report.failures.push(SettlementFailure {
                        transaction_id: pending_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        if report.count > 0 {
            self.notifications
                .notify(
                    user_id,
                    "pending_transfers_completed",
                    "Transfers received",
                    &format!(
                        "You received {} transfer(s) totalling {}",
                        report.count,
                        format_amount(report.total_amount)
                    ),
                    serde_json::json!({
                        "accountId": account_id,
                        "count": report.count,
                        "totalAmount": report.total_amount,
                    }),
                )
                .await;
        }

        Ok(report)
    }

    /// Settles one pending transfer in its own database transaction.
    ///
    /// Returns the settled pending row, or `None` when the row is no
    /// longer pending (settled concurrently).
    async fn settle_one(
        &self,
        pending_id: Uuid,
        account_id: Uuid,
        recipient_email: &str,
    ) -> Result<Option<transactions::Model>, TransactionError> {
        let txn = self.db.begin().await?;

        let Some(pending) = transactions::Entity::find_by_id(pending_id)
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .filter(transactions::Column::RelatedAccountId.is_null())
            .filter(transactions::Column::CounterpartyEmail.eq(recipient_email))
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let dest = lock_account(&txn, account_id).await?;
        self.settle_into(&txn, &pending, dest).await?;
        txn.commit().await?;

        Ok(Some(pending))
    }

    /// The settlement step shared by acceptance and bulk settlement:
    /// credit the destination and flip the pending row, atomically.
    async fn settle_into(
        &self,
        txn: &DatabaseTransaction,
        pending: &transactions::Model,
        dest: accounts::Model,
    ) -> Result<transactions::Model, TransactionError> {
        let dest_id = dest.id;

        let credit = self
            .post_movement(
                txn,
                dest,
                Movement {
                    signed_amount: pending.amount,
                    kind: TransactionType::Deposit,
                    status: TransactionStatus::Completed,
                    description: pending
                        .description
                        .clone()
                        .or_else(|| Some("Transfer received".to_string())),
                    related_account_id: Some(pending.account_id),
                    counterparty_email: None,
                },
            )
            .await?;

        let mut active: transactions::ActiveModel = pending.clone().into();
        active.status = Set(TransactionStatus::Completed);
        active.related_account_id = Set(Some(dest_id));
        active.update(txn).await?;

        Ok(credit)
    }

    /// Tells the original sender their deferred transfer settled.
    async fn notify_sender_settled(
        &self,
        pending: &transactions::Model,
        recipient_email: &str,
        how: &str,
    ) {
        let sender = accounts::Entity::find_by_id(pending.account_id)
            .one(&self.db)
            .await
            .ok()
            .flatten();
        let Some(sender) = sender else { return };

        self.notifications
            .notify(
                sender.user_id,
                "transfer_completed",
                "Transfer completed",
                &format!(
                    "Your transfer of {} to {recipient_email} was {how}",
                    format_amount(pending.amount)
                ),
                serde_json::json!({
                    "transactionId": pending.id,
                    "amount": pending.amount,
                }),
            )
            .await;
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Lists a user's transactions across their accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<transactions::Model>, TransactionError> {
        let mut query = transactions::Entity::find()
            .join(JoinType::InnerJoin, transactions::Relation::Account.def())
            .filter(accounts::Column::UserId.eq(user_id));

        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(transactions::Column::TransactionType.eq(transaction_type));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(transactions::Column::CreatedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Finds one transaction posted against any of the user's accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_transaction(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<transactions::Model>, TransactionError> {
        let row = transactions::Entity::find_by_id(id)
            .join(JoinType::InnerJoin, transactions::Relation::Account.def())
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(row)
    }
}

// ============================================================================
// Lock and query helpers
// ============================================================================

/// Locks an account row for update.
async fn lock_account(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<accounts::Model, TransactionError> {
    accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(TransactionError::AccountNotFound(account_id))
}

/// Locks an account row for update, requiring the given owner.
async fn lock_owned_account(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    user_id: Uuid,
) -> Result<accounts::Model, TransactionError> {
    accounts::Entity::find_by_id(account_id)
        .filter(accounts::Column::UserId.eq(user_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(TransactionError::AccountNotFound(account_id))
}

/// Sums an account's outgoing transfer volume for one calendar day (UTC).
///
/// Pending rows count: a deferred transfer has already moved the sender's
/// money that day, so excluding it would let deferred transfers bypass
/// the cap.
async fn daily_transfer_total(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    day: NaiveDate,
) -> Result<Decimal, DbErr> {
    let (start, end) = day_bounds(day);

    let total: Option<Option<Decimal>> = transactions::Entity::find()
        .select_only()
        .column_as(transactions::Column::Amount.sum(), "total")
        .filter(transactions::Column::AccountId.eq(account_id))
        .filter(transactions::Column::TransactionType.eq(TransactionType::Transfer))
        .filter(
            transactions::Column::Status
                .is_in([TransactionStatus::Pending, TransactionStatus::Completed]),
        )
        .filter(transactions::Column::CreatedAt.gte(start))
        .filter(transactions::Column::CreatedAt.lt(end))
        .into_tuple()
        .one(txn)
        .await?;

    Ok(total.flatten().unwrap_or(Decimal::ZERO))
}

/// Half-open UTC bounds `[start, end)` of a calendar day.
fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}
