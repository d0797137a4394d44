use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;
use std::any::Any;

use serde::Serialize;
pub use server::{AuthenticatedUser, ServerState, router, run_with_listener};

mod auth;
mod budgets;
mod health;
mod server;
mod transactions;
mod views;
mod wallets;

pub enum ServerError {
    Engine(EngineError),
    /// The request could not be decoded (bad JSON, bad path parameter).
    BadRequest(String),
    /// Missing or malformed `Authorization: Bearer` header.
    Unauthorized(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateEmail(_) => StatusCode::CONFLICT,
        EngineError::InvalidCredentials | EngineError::InvalidToken(_) => {
            StatusCode::UNAUTHORIZED
        }
        EngineError::InvalidId(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidInput(_)
        | EngineError::EmptyInput(_)
        | EngineError::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Configuration(_) | EngineError::Hashing(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    if err.is_internal() {
        tracing::error!("internal error: {err}");
        return "internal server error".to_string();
    }
    tracing::info!("request rejected: {err}");
    match err {
        // Never tell the caller why a token was refused.
        EngineError::InvalidToken(_) => "unauthorized".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::BadRequest(err) => {
                tracing::info!("bad request: {err}");
                (StatusCode::BAD_REQUEST, err)
            }
            ServerError::Unauthorized(err) => {
                tracing::info!("unauthorized: {err}");
                (StatusCode::UNAUTHORIZED, "unauthorized".to_string())
            }
        };

        (status, Json(Error { error })).into_response()
    }
}

/// Turns a panic caught in a handler into the usual internal error body.
pub(crate) fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Error {
            error: "internal server error".to_string(),
        }),
    )
        .into_response()
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    fn status(err: EngineError) -> StatusCode {
        ServerError::from(err).into_response().status()
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        assert_eq!(
            status(EngineError::KeyNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn engine_duplicate_email_maps_to_409() {
        assert_eq!(
            status(EngineError::DuplicateEmail("a@x.com".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn engine_auth_failures_map_to_401() {
        assert_eq!(status(EngineError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(EngineError::InvalidToken("token expired".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn engine_validation_maps_to_422() {
        assert_eq!(
            status(EngineError::InvalidAmount("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::InsufficientFunds("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn engine_internal_maps_to_500() {
        assert_eq!(
            status(EngineError::Database(DbErr::Custom("boom".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(EngineError::Configuration("no secret".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_maps_to_400() {
        let res = ServerError::BadRequest("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
