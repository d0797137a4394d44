use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, TokenIssuer};
use migration::MigratorTrait;
use server::{ServerState, router};

async fn app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .token_issuer(TokenIssuer::new("test-secret").unwrap())
        .build()
        .await
        .unwrap();
    router(ServerState {
        engine: Arc::new(engine),
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_with_authorization(
    app: &Router,
    uri: &str,
    authorization: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "full_name": "Alice",
            "email": email,
            "password": "longenough1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

async fn new_wallet(app: &Router, token: &str, balance: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/wallet",
        Some(token),
        Some(json!({
            "name": "Cash",
            "type": "personal",
            "currency": "eur",
            "balance": balance,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public_and_carries_request_id() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = app().await;
    let token = register(&app, "A@X.com").await;

    let (status, body) = send(&app, Method::GET, "/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("a@x.com"));
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({"full_name": "Alice", "email": "a@x.com", "password": "longenough1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "wrongpassword"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, unknown) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({"email": "nobody@x.com", "password": "wrongpassword"})),
    )
    .await;
    assert_eq!(body, unknown);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "longenough1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_valid_session() {
    let app = app().await;

    let (status, _) = send(&app, Method::GET, "/v1/wallet", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/v1/wallet", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "a@x.com").await;
    let (status, _) = send(&app, Method::GET, "/v1/wallet", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // A valid token is still refused when it is not sent as a bearer token.
    for authorization in [
        "Basic abc".to_string(),
        "Token abc".to_string(),
        format!("Token {token}"),
        format!("Basic {token}"),
        token.clone(),
        "Bearer".to_string(),
    ] {
        let (status, body) =
            send_with_authorization(&app, "/v1/wallet", &authorization).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization}");
        assert_eq!(body, json!({"error": "unauthorized"}), "{authorization}");
    }

    let (status, _) = send(&app, Method::POST, "/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, "/v1/wallet", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("unauthorized"));
}

#[tokio::test]
async fn wallet_and_transaction_flow() {
    let app = app().await;
    let token = register(&app, "a@x.com").await;
    let wallet_id = new_wallet(&app, &token, "100.00").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/budget",
        Some(&token),
        Some(json!({"name": "Food", "amount": "300", "type": "monthly", "category": "food"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], json!("300.00"));
    let budget_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/transaction",
        Some(&token),
        Some(json!({
            "amount": "150.00",
            "type": "expense",
            "transaction_date": "2026-03-01T09:30:00Z",
            "wallet_id": wallet_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/transaction",
        Some(&token),
        Some(json!({
            "amount": "40.00",
            "type": "expense",
            "note": "groceries",
            "transaction_date": "2026-03-01T09:30:00Z",
            "wallet_id": wallet_id,
            "budget_id": budget_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["amount"], json!("40.00"));
    assert_eq!(body["wallet"]["id"], json!(wallet_id));
    assert_eq!(body["budget"]["name"], json!("Food"));
    let transaction_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/v1/wallet/{wallet_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], json!("60.00"));
    assert_eq!(body["currency"], json!("EUR"));

    let (status, body) = send(&app, Method::GET, "/v1/transaction", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/v1/transaction/{transaction_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"], json!("groceries"));
}

#[tokio::test]
async fn foreign_resources_look_missing() {
    let app = app().await;
    let alice = register(&app, "a@x.com").await;
    let bob = register(&app, "b@x.com").await;
    let wallet_id = new_wallet(&app, &alice, "10.00").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/v1/wallet/{wallet_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/transaction",
        Some(&bob),
        Some(json!({
            "amount": "1.00",
            "type": "income",
            "transaction_date": "2026-03-01T09:30:00Z",
            "wallet_id": wallet_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/v1/wallet", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let app = app().await;
    let token = register(&app, "a@x.com").await;

    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/wallet/not-a-uuid",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/wallet",
        Some(&token),
        Some(json!({"name": "Cash", "type": "savings", "currency": "EUR", "balance": "1.00"})),
    )
    .await;
    assert!(status.is_client_error());

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/wallet",
        Some(&token),
        Some(json!({"name": "Cash", "type": "personal", "currency": "EUR", "balance": "1.005"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleted_profile_cannot_authenticate() {
    let app = app().await;
    let token = register(&app, "a@x.com").await;

    let (status, _) = send(&app, Method::DELETE, "/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "longenough1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
