//! Ownership checks.
//!
//! The link tables are the only source of truth for visibility: a user may
//! touch a wallet, budget or transaction only if a link row pairs them.
//! A missing link and a missing entity are reported the same way.

use sea_orm::{ConnectionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, has_budgets, has_transactions, has_wallets};

use super::Engine;

/// Generates `_owned_by` and `require_` methods for a linked entity.
macro_rules! impl_owned_by {
    ($owned_fn:ident, $require_fn:ident, $link:path, $err_msg:literal) => {
        pub(super) async fn $owned_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<bool> {
            <$link>::find_by_id((user_id.to_string(), target_id.to_string()))
                .one(db)
                .await
                .map(|model| model.is_some())
                .map_err(Into::into)
        }

        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<()> {
            if !self.$owned_fn(db, user_id, target_id).await? {
                return Err(EngineError::KeyNotFound($err_msg.to_string()));
            }
            Ok(())
        }
    };
}

impl Engine {
    impl_owned_by!(
        wallet_owned_by,
        require_wallet_owned,
        has_wallets::Entity,
        "wallet not exists"
    );

    impl_owned_by!(
        budget_owned_by,
        require_budget_owned,
        has_budgets::Entity,
        "budget not exists"
    );

    impl_owned_by!(
        transaction_owned_by,
        require_transaction_owned,
        has_transactions::Entity,
        "transaction not exists"
    );
}
