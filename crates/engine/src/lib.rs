//! Bookkeeping core: accounts, sessions, wallets, budgets and transactions.
//!
//! Every money movement runs inside one database transaction together with
//! the ledger row that records it, so a balance change is durable if and only
//! if its transaction is.

pub use budgets::Budget;
pub use commands::{BudgetNew, TransactionNew, WalletNew};
pub use credentials::{hash_password, verify_password};
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, TransactionStage};
pub use sessions::Session;
pub use tokens::{Claims, IssuedToken, TOKEN_ISSUER, TOKEN_LIFETIME_SECS, TokenIssuer};
pub use transactions::{Transaction, TransactionDetail, TransactionKind};
pub use users::User;
pub use wallets::{Wallet, WalletKind};

mod budgets;
mod commands;
mod credentials;
mod error;
mod has_budgets;
mod has_transactions;
mod has_wallets;
mod money;
mod ops;
mod sessions;
mod tokens;
mod transactions;
mod users;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
