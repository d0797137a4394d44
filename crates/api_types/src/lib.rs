//! Request and response bodies of the HTTP API.
//!
//! Amounts travel as decimal strings with two fractional digits (`"100.00"`),
//! never as floats. Ids are UUIDs serialized as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub full_name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub full_name: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Returned by register and login.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub user: UserView,
        pub token: String,
        /// Absolute expiry of `token`.
        pub expires_at: DateTime<Utc>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletKind {
        Personal,
        Business,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: WalletKind,
        pub currency: String,
        /// Opening balance, e.g. `"100.00"`.
        pub balance: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: WalletKind,
        pub currency: String,
        pub balance: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub name: String,
        pub amount: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub category: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub amount: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub category: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        Transfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        /// Strictly positive amount, e.g. `"40.00"`.
        pub amount: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub note: Option<String>,
        pub transaction_date: DateTime<Utc>,
        pub wallet_id: Uuid,
        pub budget_id: Option<Uuid>,
    }

    /// Minimal reference to the wallet or budget a transaction points at.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Ref {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub amount: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub note: Option<String>,
        pub transaction_date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub wallet: Ref,
        pub budget: Option<Ref>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub success: bool,
        pub message: String,
        pub timestamp: DateTime<Utc>,
    }
}
