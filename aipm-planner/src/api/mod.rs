//! HTTP API handlers for the planner service

pub mod health;
pub mod plan;
pub mod projects;

pub use health::health_routes;
pub use plan::plan_routes;
pub use projects::project_routes;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

/// GET /
///
/// Service information and available endpoints.
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the AIPM Planner API",
        "version": env!("CARGO_PKG_VERSION"),
        "available_endpoints": {
            "projects": {
                "create": "POST /api/projects - Create a new project",
                "list": "GET /api/projects - List all projects",
                "get_description": "GET /api/projects/{project_id}/description - Get project description",
                "update": "PATCH /api/projects/{project_id} - Partial update",
                "delete": "DELETE /api/projects/{project_id} - Soft delete a project"
            },
            "planning": {
                "generate_plan": "GET /api/projects/{project_id}/plan - Generate or fetch the project plan",
                "refine_tasks": "POST /api/refine-tasks/{project_id} - Refine tasks into subtasks"
            }
        },
        "status": "operational",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Build service-info routes
pub fn info_routes() -> Router<AppState> {
    Router::new().route("/", get(service_info))
}
