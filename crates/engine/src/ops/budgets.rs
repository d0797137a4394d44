use chrono::Utc;
use sea_orm::{JoinType, QueryFilter, QuerySelect, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    Budget, BudgetNew, EngineError, ResultEngine, budgets, has_budgets, util::normalize_required,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a budget and links it to `user_id` in one atomic unit.
    pub async fn new_budget(&self, user_id: Uuid, cmd: BudgetNew) -> ResultEngine<Budget> {
        let name = normalize_required(&cmd.name, "budget name")?;
        let kind = normalize_required(&cmd.kind, "budget type")?;
        let category = normalize_required(&cmd.category, "budget category")?;
        if cmd.amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget amount must be >= 0".to_string(),
            ));
        }
        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4(),
            name,
            amount: cmd.amount,
            kind,
            category,
            created_at: now,
            updated_at: now,
        };

        with_tx!(self, |db_tx| {
            budgets::ActiveModel::from(&budget).insert(&db_tx).await?;
            has_budgets::link(user_id, budget.id).insert(&db_tx).await?;
            info!(%user_id, budget_id = %budget.id, "budget created");
            Ok(budget)
        })
    }

    /// Returns every budget linked to `user_id`, in no particular order.
    pub async fn list_budgets(&self, user_id: Uuid) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .join(JoinType::InnerJoin, budgets::Relation::HasBudgets.def())
            .filter(has_budgets::Column::UserId.eq(user_id.to_string()))
            .all(&self.database)
            .await?;
        models.into_iter().map(Budget::try_from).collect()
    }
}
