//! Transactions API endpoints.

use api_types::transaction::{TransactionNew, TransactionView};
use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use engine::Money;
use uuid::Uuid;

use crate::{AuthenticatedUser, ServerError, server::ServerState, views};

pub async fn transaction_new(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    payload: Result<Json<TransactionNew>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let Json(payload) = payload?;
    let amount: Money = payload.amount.parse()?;

    let mut cmd = engine::TransactionNew::new(
        amount,
        views::transaction_kind(payload.kind),
        payload.wallet_id,
        payload.transaction_date,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    if let Some(budget_id) = payload.budget_id {
        cmd = cmd.budget_id(budget_id);
    }

    let detail = state.engine.new_transaction(caller.user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(views::transaction_view(&detail))))
}

pub async fn list(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let transactions = state.engine.list_transactions(caller.user.id).await?;
    Ok(Json(
        transactions.iter().map(views::transaction_view).collect(),
    ))
}

pub async fn get_detail(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    transaction_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TransactionView>, ServerError> {
    let Path(transaction_id) = transaction_id?;
    let detail = state
        .engine
        .transaction(caller.user.id, transaction_id)
        .await?;
    Ok(Json(views::transaction_view(&detail)))
}
