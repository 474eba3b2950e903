use axum::Json;
use serde_json::{json, Value};

/// Liveness of the HTTP server itself. Platform connectivity is reported by
/// `/api/stats` instead.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
