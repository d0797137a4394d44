use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use std::sync::Arc;

use crate::{ServerError, auth, budgets, health, transactions, wallets};
use engine::{Engine, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// The caller behind a request, resolved by the auth middleware.
///
/// Handlers behind the middleware take it as `Extension<AuthenticatedUser>`.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    /// The bearer token the request was authenticated with.
    pub token: String,
}

async fn auth(
    State(state): State<ServerState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Ok(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized(
            "missing or malformed bearer token".to_string(),
        ));
    };
    let token = bearer.token();
    if token.is_empty() {
        return Err(ServerError::Unauthorized("empty bearer token".to_string()));
    }

    let user = state.engine.resolve(token).await?;
    tracing::debug!(user_id = %user.id, "request authenticated");

    request.extensions_mut().insert(AuthenticatedUser {
        user,
        token: token.to_string(),
    });
    Ok(next.run(request).await)
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health::get))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(auth::profile).delete(auth::delete_profile))
        .route("/wallet", get(wallets::list).post(wallets::wallet_new))
        .route("/wallet/{id}", get(wallets::get))
        .route("/budget", get(budgets::list).post(budgets::budget_new))
        .route(
            "/transaction",
            get(transactions::list).post(transactions::transaction_new),
        )
        .route("/transaction/{id}", get(transactions::get_detail))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    with_middleware(Router::new().nest("/v1", public.merge(protected))).with_state(state)
}

/// Request id, tracing and panic recovery shared by every route.
fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(crate::panic_response)),
    )
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn boom() -> &'static str {
        panic!("handler blew up")
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        let app = with_middleware(Router::new().route("/boom", get(boom)));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"error":"internal server error"}"#);
    }
}
