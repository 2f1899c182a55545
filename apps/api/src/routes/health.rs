use axum::Json;
use serde_json::{json, Value};

/// GET /apis/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "API is running"
    }))
}
