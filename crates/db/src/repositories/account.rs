//! Account repository for account lifecycle operations.
//!
//! Balances are only ever mutated through the transaction repository's
//! movement primitives; this repository covers creation, lookup,
//! metadata patches, and deletion.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use centime_core::ledger::{generate_account_number, normalize_account_number};
use centime_shared::AppError;

use crate::entities::{
    accounts,
    sea_orm_active_enums::{AccountType, TransactionStatus},
    transactions,
};
use crate::repositories::audit::{AuditLogRepository, SourceContext};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found, or not owned by the caller.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Cannot delete an account holding money.
    #[error("Cannot delete account with non-zero balance: {0}")]
    NonZeroBalance(Decimal),

    /// Cannot delete an account with unsettled outgoing transfers.
    #[error("Cannot delete account: {0} pending transfer(s) outstanding")]
    HasPendingTransfers(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::NonZeroBalance(_) | AccountError::HasPendingTransfers(_) => {
                Self::BusinessRule(err.to_string())
            }
            AccountError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Input for patching an account.
///
/// Only present fields are applied; everything else is left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Display label.
    pub label: Option<String>,
}

/// Account repository for lifecycle operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    audit: AuditLogRepository,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, audit: AuditLogRepository) -> Self {
        Self { db, audit }
    }

    /// Opens a new, empty account for a user.
    ///
    /// The account number is derived from the account id, so it is unique
    /// and never reused. The balance starts at zero; pending transfers
    /// addressed to the owner's email are settled separately by
    /// `TransactionRepository::settle_pending_transfers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_account(
        &self,
        user_id: Uuid,
        account_type: AccountType,
        label: Option<String>,
        source: &SourceContext,
    ) -> Result<accounts::Model, AccountError> {
        let id = Uuid::new_v4();
        let account_number = generate_account_number(id);
        let label = label.unwrap_or_else(|| match account_type {
            AccountType::Current => "Current account".to_string(),
            AccountType::Savings => "Savings account".to_string(),
        });

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            account_type: Set(account_type),
            label: Set(label),
            balance: Set(Decimal::ZERO),
            account_number: Set(account_number.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account = account.insert(&self.db).await?;

        self.audit
            .record(
                Some(user_id),
                "account_created",
                serde_json::json!({ "accountId": id, "accountNumber": account_number }),
                source,
            )
            .await;

        Ok(account)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<accounts::Model>, AccountError> {
        let account = accounts::Entity::find_by_id(id).one(&self.db).await?;
        Ok(account)
    }

    /// Finds an account by ID, requiring the given owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let account = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Finds an account by its account number, whitespace-insensitive.
    ///
    /// Stored numbers carry no whitespace, so normalizing the input is
    /// enough for an exact match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let normalized = normalize_account_number(account_number);
        let account = accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(normalized))
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Lists a user's accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<accounts::Model>, AccountError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_desc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Finds the account email-addressed transfers credit: the user's
    /// oldest `current`-type account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::AccountType.eq(AccountType::Current))
            .order_by_asc(accounts::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Applies a patch to an owned account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not exist or is not owned
    /// by the caller.
    pub async fn update_account(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        let account = self
            .find_owned(id, user_id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        let mut active: accounts::ActiveModel = account.into();
        if let Some(label) = input.label {
            active.label = Set(label);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Deletes an owned account.
    ///
    /// Precondition: the balance is exactly zero and no outgoing transfer
    /// is still pending settlement (a pending debit means money already
    /// left this account and must stay addressable for settlement).
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `NonZeroBalance`, or `HasPendingTransfers`
    /// when the preconditions do not hold.
    pub async fn delete_account(
        &self,
        id: Uuid,
        user_id: Uuid,
        source: &SourceContext,
    ) -> Result<(), AccountError> {
        let account = self
            .find_owned(id, user_id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        if !account.balance.is_zero() {
            return Err(AccountError::NonZeroBalance(account.balance));
        }

        let pending = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .count(&self.db)
            .await?;
        if pending > 0 {
            return Err(AccountError::HasPendingTransfers(pending));
        }

        account.delete(&self.db).await?;

        self.audit
            .record(
                Some(user_id),
                "account_deleted",
                serde_json::json!({ "accountId": id }),
                source,
            )
            .await;

        Ok(())
    }
}
