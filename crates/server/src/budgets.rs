//! Budgets API endpoints.

use api_types::budget::{BudgetNew, BudgetView};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::Money;

use crate::{AuthenticatedUser, ServerError, server::ServerState, views};

pub async fn budget_new(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    payload: Result<Json<BudgetNew>, JsonRejection>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let Json(payload) = payload?;
    let amount: Money = payload.amount.parse()?;
    let budget = state
        .engine
        .new_budget(
            caller.user.id,
            engine::BudgetNew::new(payload.name, amount, payload.kind, payload.category),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::budget_view(&budget))))
}

pub async fn list(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state.engine.list_budgets(caller.user.id).await?;
    Ok(Json(budgets.iter().map(views::budget_view).collect()))
}
