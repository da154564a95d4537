use axum::extract::State;
use axum::Json;

use crate::api::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Readiness plus the fill policy this instance enforces.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ready",
        "odometerPolicy": state.config.odometer_policy.to_string(),
    }))
}
