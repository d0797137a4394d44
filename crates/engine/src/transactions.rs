//! Transaction primitives.
//!
//! A `Transaction` is an immutable ledger entry. Its amount is always strictly
//! positive; the direction of the money movement is carried by its
//! [`TransactionKind`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{Budget, EngineError, Money, ResultEngine, Wallet, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    /// Credits the wallet.
    Income,
    /// Debits the wallet, only if the balance covers the amount.
    Expense,
    /// Recorded for categorization only; balances are left untouched.
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Money,
    pub kind: TransactionKind,
    pub note: Option<String>,
    /// Caller-supplied date of the event, distinct from `created_at`.
    pub transaction_date: DateTime<Utc>,
    pub wallet_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        amount: Money,
        kind: TransactionKind,
        note: Option<String>,
        transaction_date: DateTime<Utc>,
        wallet_id: Uuid,
        budget_id: Option<Uuid>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "transaction amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            amount,
            kind,
            note,
            transaction_date,
            wallet_id,
            budget_id,
            created_at: Utc::now(),
        })
    }
}

/// A transaction with its wallet and optional budget resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDetail {
    pub id: Uuid,
    pub amount: Money,
    pub kind: TransactionKind,
    pub note: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub wallet: Wallet,
    pub budget: Option<Budget>,
}

impl TransactionDetail {
    pub(crate) fn from_parts(
        model: Model,
        wallet: Wallet,
        budget: Option<Budget>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            amount: Money::new(model.amount_minor),
            kind: TransactionKind::try_from(model.kind.as_str())?,
            note: model.note,
            transaction_date: model.transaction_date,
            created_at: model.created_at,
            wallet,
            budget,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub amount_minor: i64,
    pub kind: String,
    pub note: Option<String>,
    pub transaction_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub wallet_id: String,
    pub budget_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Budgets,
    #[sea_orm(has_many = "super::has_transactions::Entity")]
    HasTransactions,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::has_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HasTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            note: ActiveValue::Set(tx.note.clone()),
            transaction_date: ActiveValue::Set(tx.transaction_date),
            created_at: ActiveValue::Set(tx.created_at),
            wallet_id: ActiveValue::Set(tx.wallet_id.to_string()),
            budget_id: ActiveValue::Set(tx.budget_id.map(|id| id.to_string())),
        }
    }
}
