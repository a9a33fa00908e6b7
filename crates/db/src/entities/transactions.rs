//! `SeaORM` Entity for transactions table.
//!
//! Rows are append-only. `balance_before`/`balance_after` are snapshots
//! taken at posting time and never change; once `status` is `completed`
//! the row is immutable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The account this row is posted against.
    pub account_id: Uuid,
    /// The counterpart account of a transfer, once known.
    pub related_account_id: Option<Uuid>,
    #[sea_orm(column_name = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub status: TransactionStatus,
    pub description: Option<String>,
    /// Email used to resolve a not-yet-existing recipient of a deferred
    /// transfer. Null on every other kind of row.
    pub counterparty_email: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::RelatedAccountId",
        to = "super::accounts::Column::Id"
    )]
    RelatedAccount,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
