//! Health check endpoint.
//!
//! Liveness only: answers while the process is serving requests and does not
//! touch the database.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Liveness check.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// { "success": true, "status": "ok" }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "success": true, "status": "ok" })))
}
