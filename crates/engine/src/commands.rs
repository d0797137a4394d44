//! Command structs for engine operations.
//!
//! These types group parameters for create operations, keeping call sites
//! readable and avoiding long argument lists. Normalization and validation
//! happen in the engine, not here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Money, TransactionKind, WalletKind};

/// Create a wallet with an opening balance.
#[derive(Clone, Debug)]
pub struct WalletNew {
    pub name: String,
    pub kind: WalletKind,
    pub currency: String,
    pub balance: Money,
}

impl WalletNew {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: WalletKind,
        currency: impl Into<String>,
        balance: Money,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            currency: currency.into(),
            balance,
        }
    }
}

/// Create a budget.
#[derive(Clone, Debug)]
pub struct BudgetNew {
    pub name: String,
    pub amount: Money,
    pub kind: String,
    pub category: String,
}

impl BudgetNew {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        amount: Money,
        kind: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            kind: kind.into(),
            category: category.into(),
        }
    }
}

/// Record a transaction against a wallet.
#[derive(Clone, Debug)]
pub struct TransactionNew {
    pub amount: Money,
    pub kind: TransactionKind,
    pub wallet_id: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub note: Option<String>,
    pub budget_id: Option<Uuid>,
}

impl TransactionNew {
    #[must_use]
    pub fn new(
        amount: Money,
        kind: TransactionKind,
        wallet_id: Uuid,
        transaction_date: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            kind,
            wallet_id,
            transaction_date,
            note: None,
            budget_id: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn budget_id(mut self, budget_id: Uuid) -> Self {
        self.budget_id = Some(budget_id);
        self
    }
}
