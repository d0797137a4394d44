use chrono::Utc;
use sea_orm::{
    DatabaseTransaction, JoinType, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
    sea_query::{Expr, Query, SelectStatement},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Wallet, WalletNew, has_wallets,
    util::{normalize_currency, normalize_required},
    wallets,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a wallet and links it to `user_id` in one atomic unit.
    pub async fn new_wallet(&self, user_id: Uuid, cmd: WalletNew) -> ResultEngine<Wallet> {
        let name = normalize_required(&cmd.name, "wallet name")?;
        let currency = normalize_currency(&cmd.currency)?;
        if cmd.balance.is_negative() {
            return Err(EngineError::InvalidAmount(
                "wallet balance must be >= 0".to_string(),
            ));
        }
        let now = Utc::now();
        let wallet = Wallet {
            id: Uuid::new_v4(),
            name,
            kind: cmd.kind,
            currency,
            balance: cmd.balance,
            created_at: now,
            updated_at: now,
        };

        with_tx!(self, |db_tx| {
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            has_wallets::link(user_id, wallet.id).insert(&db_tx).await?;
            info!(%user_id, wallet_id = %wallet.id, "wallet created");
            Ok(wallet)
        })
    }

    /// Returns every wallet linked to `user_id`, in no particular order.
    pub async fn list_wallets(&self, user_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        let models = wallets::Entity::find()
            .join(JoinType::InnerJoin, wallets::Relation::HasWallets.def())
            .filter(has_wallets::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?;
        models.into_iter().map(Wallet::try_from).collect()
    }

    /// Return a snapshot of one wallet owned by `user_id`.
    pub async fn wallet(&self, user_id: Uuid, wallet_id: Uuid) -> ResultEngine<Wallet> {
        self.require_wallet_owned(&self.database, user_id, wallet_id)
            .await?;
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }

    /// Subtracts `amount` from a wallet owned by `user_id`, only if the
    /// balance covers it.
    ///
    /// Ownership, the balance check and the write are one conditional
    /// `UPDATE`, so concurrent decreases cannot race the balance below zero.
    /// Zero rows affected means insufficient funds or a wallet the user does
    /// not own.
    pub(super) async fn decrease_balance(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        wallet_id: Uuid,
        amount: Money,
    ) -> ResultEngine<u64> {
        let res = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::BalanceMinor,
                Expr::col(wallets::Column::BalanceMinor).sub(amount.minor()),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id.to_string()))
            .filter(wallets::Column::Id.in_subquery(owned_wallet_ids(user_id)))
            .filter(wallets::Column::BalanceMinor.gte(amount.minor()))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Adds `amount` to a wallet owned by `user_id`.
    ///
    /// Zero rows affected means the wallet is not the user's, or the new
    /// balance would not fit in `i64` minor units.
    pub(super) async fn increase_balance(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        wallet_id: Uuid,
        amount: Money,
    ) -> ResultEngine<u64> {
        let res = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::BalanceMinor,
                Expr::col(wallets::Column::BalanceMinor).add(amount.minor()),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id.to_string()))
            .filter(wallets::Column::Id.in_subquery(owned_wallet_ids(user_id)))
            .filter(wallets::Column::BalanceMinor.lte(i64::MAX - amount.minor()))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}

fn owned_wallet_ids(user_id: Uuid) -> SelectStatement {
    Query::select()
        .column(has_wallets::Column::WalletId)
        .from(has_wallets::Entity)
        .and_where(has_wallets::Column::UserId.eq(user_id.to_string()))
        .to_owned()
}
