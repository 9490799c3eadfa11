//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("healthy" or "unhealthy")
    pub status: String,
    /// Database status ("connected" or "error")
    pub database: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Ping failure detail, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
///
/// Never fails the request: a store ping failure is reported in the body
/// as "unhealthy" with a 200 status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, database, error) = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => ("healthy".to_string(), "connected".to_string(), None),
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            ("unhealthy".to_string(), "error".to_string(), Some(e.to_string()))
        }
    };

    Json(HealthResponse {
        status,
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
