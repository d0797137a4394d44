use api_types::health::Health;
use axum::Json;
use chrono::Utc;

pub async fn get() -> Json<Health> {
    Json(Health {
        success: true,
        message: "success".to_string(),
        timestamp: Utc::now(),
    })
}
