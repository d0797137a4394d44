//! Wallets API endpoints.

use api_types::wallet::{WalletNew, WalletView};
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

pub async fn wallet_new(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    payload: Result<Json<WalletNew>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletView>), ServerError> {
    let Json(payload) = payload?;
    let balance: Money = payload.balance.parse()?;
    let wallet = state
        .engine
        .new_wallet(
            caller.user.id,
            engine::WalletNew::new(
                payload.name,
                views::wallet_kind(payload.kind),
                payload.currency,
                balance,
            ),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::wallet_view(&wallet))))
}

pub async fn list(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let wallets = state.engine.list_wallets(caller.user.id).await?;
    Ok(Json(wallets.iter().map(views::wallet_view).collect()))
}

pub async fn get(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
    wallet_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WalletView>, ServerError> {
    let Path(wallet_id) = wallet_id?;
    let wallet = state.engine.wallet(caller.user.id, wallet_id).await?;
    Ok(Json(views::wallet_view(&wallet)))
}
