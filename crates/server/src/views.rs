//! Conversions between engine values and API bodies.

use api_types::{
    auth::{AuthResponse, UserView},
    budget::BudgetView,
    transaction::{self as api_tx, Ref, TransactionView},
    wallet::{self as api_wallet, WalletView},
};
use engine::{
    Budget, Session, TransactionDetail, TransactionKind, User, Wallet, WalletKind,
};

pub(crate) fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub(crate) fn auth_response(user: &User, session: Session) -> AuthResponse {
    AuthResponse {
        user: user_view(user),
        token: session.token,
        expires_at: session.expires_at,
    }
}

pub(crate) fn wallet_kind(kind: api_wallet::WalletKind) -> WalletKind {
    match kind {
        api_wallet::WalletKind::Personal => WalletKind::Personal,
        api_wallet::WalletKind::Business => WalletKind::Business,
    }
}

fn api_wallet_kind(kind: WalletKind) -> api_wallet::WalletKind {
    match kind {
        WalletKind::Personal => api_wallet::WalletKind::Personal,
        WalletKind::Business => api_wallet::WalletKind::Business,
    }
}

pub(crate) fn wallet_view(wallet: &Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name.clone(),
        kind: api_wallet_kind(wallet.kind),
        currency: wallet.currency.clone(),
        balance: wallet.balance.to_string(),
        created_at: wallet.created_at,
        updated_at: wallet.updated_at,
    }
}

pub(crate) fn budget_view(budget: &Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        name: budget.name.clone(),
        amount: budget.amount.to_string(),
        kind: budget.kind.clone(),
        category: budget.category.clone(),
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

pub(crate) fn transaction_kind(kind: api_tx::TransactionKind) -> TransactionKind {
    match kind {
        api_tx::TransactionKind::Income => TransactionKind::Income,
        api_tx::TransactionKind::Expense => TransactionKind::Expense,
        api_tx::TransactionKind::Transfer => TransactionKind::Transfer,
    }
}

fn api_transaction_kind(kind: TransactionKind) -> api_tx::TransactionKind {
    match kind {
        TransactionKind::Income => api_tx::TransactionKind::Income,
        TransactionKind::Expense => api_tx::TransactionKind::Expense,
        TransactionKind::Transfer => api_tx::TransactionKind::Transfer,
    }
}

pub(crate) fn transaction_view(detail: &TransactionDetail) -> TransactionView {
    TransactionView {
        id: detail.id,
        amount: detail.amount.to_string(),
        kind: api_transaction_kind(detail.kind),
        note: detail.note.clone(),
        transaction_date: detail.transaction_date,
        created_at: detail.created_at,
        wallet: Ref {
            id: detail.wallet.id,
            name: detail.wallet.name.clone(),
        },
        budget: detail.budget.as_ref().map(|budget| Ref {
            id: budget.id,
            name: budget.name.clone(),
        }),
    }
}
