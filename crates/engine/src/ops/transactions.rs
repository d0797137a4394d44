//! Transaction orchestration.
//!
//! Creating a transaction walks a fixed sequence of stages inside a single
//! database transaction:
//!
//! `Started -> BalanceAdjusted -> Recorded -> Linked -> Committed`
//!
//! Any failure moves the request to `Aborted` and drops the database
//! transaction, which rolls back every earlier stage. A balance change is
//! therefore durable if and only if its ledger row is.

use std::{collections::HashMap, fmt};

use sea_orm::{
    ConnectionTrait, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    Budget, EngineError, ResultEngine, Transaction, TransactionDetail, TransactionKind,
    TransactionNew, Wallet, budgets, has_transactions, transactions,
    util::normalize_optional_text, wallets,
};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStage {
    Started,
    BalanceAdjusted,
    Recorded,
    Linked,
    Committed,
    Aborted,
}

impl TransactionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::BalanceAdjusted => "balance_adjusted",
            Self::Recorded => "recorded",
            Self::Linked => "linked",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Engine {
    /// Records a transaction and applies its balance effect atomically.
    ///
    /// - `income` credits the wallet, failing with [`EngineError::InvalidAmount`]
    ///   when the balance would overflow;
    /// - `expense` debits it, failing with [`EngineError::InsufficientFunds`]
    ///   when the balance does not cover the amount;
    /// - `transfer` is recorded without touching any balance.
    ///
    /// The wallet, and the budget when given, must be owned by `user_id`,
    /// otherwise [`EngineError::KeyNotFound`]. On success the fully resolved
    /// detail is read back inside the same database transaction.
    pub async fn new_transaction(
        &self,
        user_id: Uuid,
        cmd: TransactionNew,
    ) -> ResultEngine<TransactionDetail> {
        let note = normalize_optional_text(cmd.note.as_deref());
        let tx = Transaction::new(
            cmd.amount,
            cmd.kind,
            note,
            cmd.transaction_date,
            cmd.wallet_id,
            cmd.budget_id,
        )?;

        let mut stage = TransactionStage::Started;
        debug!(transaction_id = %tx.id, kind = tx.kind.as_str(), %stage, "transaction started");

        let result = self.apply_transaction(user_id, &tx, &mut stage).await;
        match &result {
            Ok(_) => {
                stage = TransactionStage::Committed;
                info!(
                    transaction_id = %tx.id,
                    wallet_id = %tx.wallet_id,
                    kind = tx.kind.as_str(),
                    %stage,
                    "transaction committed"
                );
            }
            Err(err) => {
                let failed_at = stage;
                stage = TransactionStage::Aborted;
                if err.is_internal() {
                    error!(transaction_id = %tx.id, %failed_at, %stage, error = %err, "transaction aborted");
                } else {
                    info!(transaction_id = %tx.id, %failed_at, %stage, error = %err, "transaction aborted");
                }
            }
        }
        result
    }

    async fn apply_transaction(
        &self,
        user_id: Uuid,
        tx: &Transaction,
        stage: &mut TransactionStage,
    ) -> ResultEngine<TransactionDetail> {
        with_tx!(self, |db_tx| {
            // The balance write goes first so the transaction takes the write
            // lock before reading anything.
            self.adjust_balance(&db_tx, user_id, tx).await?;
            *stage = TransactionStage::BalanceAdjusted;

            if let Some(budget_id) = tx.budget_id {
                self.require_budget_owned(&db_tx, user_id, budget_id)
                    .await?;
            }

            transactions::ActiveModel::from(tx).insert(&db_tx).await?;
            *stage = TransactionStage::Recorded;

            has_transactions::link(user_id, tx.id)
                .insert(&db_tx)
                .await?;
            *stage = TransactionStage::Linked;

            self.transaction_detail(&db_tx, tx.id).await
        })
    }

    /// Applies the balance effect of `tx` to a wallet owned by `user_id`.
    ///
    /// When the conditional update touches no row, ownership is checked to
    /// tell a foreign wallet ([`EngineError::KeyNotFound`]) from a refused
    /// amount.
    async fn adjust_balance(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let refused = match tx.kind {
            TransactionKind::Income => {
                if self
                    .increase_balance(db, user_id, tx.wallet_id, tx.amount)
                    .await?
                    > 0
                {
                    return Ok(());
                }
                EngineError::InvalidAmount("balance overflow".to_string())
            }
            TransactionKind::Expense => {
                if self
                    .decrease_balance(db, user_id, tx.wallet_id, tx.amount)
                    .await?
                    > 0
                {
                    return Ok(());
                }
                EngineError::InsufficientFunds(format!(
                    "wallet balance does not cover {}",
                    tx.amount
                ))
            }
            TransactionKind::Transfer => {
                return self.require_wallet_owned(db, user_id, tx.wallet_id).await;
            }
        };

        self.require_wallet_owned(db, user_id, tx.wallet_id).await?;
        Err(refused)
    }

    /// Returns one transaction owned by `user_id` with wallet and budget resolved.
    pub async fn transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<TransactionDetail> {
        self.require_transaction_owned(&self.database, user_id, transaction_id)
            .await?;
        self.transaction_detail(&self.database, transaction_id)
            .await
    }

    /// Returns every transaction linked to `user_id`, newest first.
    pub async fn list_transactions(&self, user_id: Uuid) -> ResultEngine<Vec<TransactionDetail>> {
        let models = transactions::Entity::find()
            .join(
                JoinType::InnerJoin,
                transactions::Relation::HasTransactions.def(),
            )
            .filter(has_transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut wallet_ids: Vec<String> = models.iter().map(|m| m.wallet_id.clone()).collect();
        wallet_ids.sort();
        wallet_ids.dedup();
        let mut budget_ids: Vec<String> =
            models.iter().filter_map(|m| m.budget_id.clone()).collect();
        budget_ids.sort();
        budget_ids.dedup();

        let wallets_by_id: HashMap<String, Wallet> = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in(wallet_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Ok((model.id.clone(), Wallet::try_from(model)?)))
            .collect::<ResultEngine<_>>()?;
        let budgets_by_id: HashMap<String, Budget> = if budget_ids.is_empty() {
            HashMap::new()
        } else {
            budgets::Entity::find()
                .filter(budgets::Column::Id.is_in(budget_ids))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|model| Ok((model.id.clone(), Budget::try_from(model)?)))
                .collect::<ResultEngine<_>>()?
        };

        models
            .into_iter()
            .map(|model| {
                let wallet = wallets_by_id
                    .get(&model.wallet_id)
                    .cloned()
                    .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
                let budget = model
                    .budget_id
                    .as_ref()
                    .and_then(|id| budgets_by_id.get(id))
                    .cloned();
                TransactionDetail::from_parts(model, wallet, budget)
            })
            .collect()
    }

    async fn transaction_detail<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction_id: Uuid,
    ) -> ResultEngine<TransactionDetail> {
        let (model, wallet) = transactions::Entity::find_by_id(transaction_id.to_string())
            .find_also_related(wallets::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        let wallet = wallet
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))
            .and_then(Wallet::try_from)?;

        let budget = match model.budget_id.as_ref() {
            Some(budget_id) => budgets::Entity::find_by_id(budget_id.clone())
                .one(db)
                .await?
                .map(Budget::try_from)
                .transpose()?,
            None => None,
        };

        TransactionDetail::from_parts(model, wallet, budget)
    }
}
