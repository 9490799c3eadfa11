//! Project CRUD handlers

use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Project, ProjectCreate, ProjectListEntry, ProjectUpdate};
use crate::{db, AppState};

fn parse_project_id(id: &str) -> ApiResult<Uuid> {
    Ok(aipm_common::ids::parse(id)?)
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<ProjectCreate>,
) -> ApiResult<Json<Project>> {
    info!(title = %payload.title, "Creating new project");

    let created = db::projects::create_project(&state.db, payload)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create project: {}", e)))?;

    info!(project_id = %created.id, "Project created");
    Ok(Json(created))
}

/// GET /api/projects
///
/// All records come back, soft-deleted included, each annotated with a
/// derived `has_plan` flag.
pub async fn list_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProjectListEntry>>> {
    let projects = db::projects::list_projects(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to list projects: {}", e)))?;

    info!(count = projects.len(), "Listed projects");
    Ok(Json(projects))
}

/// GET /api/projects/{id}/description
pub async fn get_project_description(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_project_id(&project_id)?;

    let project = db::projects::get_project(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(json!({
        "id": project.id,
        "title": project.title,
        "description": project.description,
    })))
}

/// PATCH /api/projects/{id}
///
/// Partial update: only supplied fields change, `updated_at` refreshes.
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    if update.is_empty() {
        return Err(ApiError::BadRequest("No update data provided".to_string()));
    }
    let id = parse_project_id(&project_id)?;

    let updated = db::projects::update_project(&state.db, id, update)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    info!(%project_id, "Project updated");
    Ok(Json(updated))
}

/// DELETE /api/projects/{id}
///
/// Soft delete: status becomes "deleted", record stays queryable.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = parse_project_id(&project_id)?;

    let deleted = db::projects::soft_delete_project(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    info!(%project_id, "Project soft-deleted");
    Ok(Json(deleted))
}

/// Build project CRUD routes
pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/:project_id/description",
            get(get_project_description),
        )
        .route(
            "/api/projects/:project_id",
            patch(update_project).delete(delete_project),
        )
}
