//! Registration, login, logout and profile endpoints.

use api_types::auth::{AuthResponse, Login, Register, UserView};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{AuthenticatedUser, ServerError, server::ServerState, views};

pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<Register>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    let Json(payload) = payload?;
    let (user, session) = state
        .engine
        .register(&payload.full_name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(views::auth_response(&user, session)),
    ))
}

pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<AuthResponse>, ServerError> {
    let Json(payload) = payload?;
    let (user, session) = state
        .engine
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(views::auth_response(&user, session)))
}

pub async fn logout(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.revoke(&caller.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(Extension(caller): Extension<AuthenticatedUser>) -> Json<UserView> {
    Json(views::user_view(&caller.user))
}

pub async fn delete_profile(
    Extension(caller): Extension<AuthenticatedUser>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_user(caller.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
