//! Health Route

use axum::Json;
use serde::{Deserialize, Serialize};

/// Health response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Liveness check; independent of pipeline state
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "API is running.".to_string(),
    })
}
