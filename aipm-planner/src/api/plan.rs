//! Plan generation and task refinement handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::RefinementResult;
use crate::planner::{PlanSynthesizer, ProjectContext, TaskRefiner};
use crate::{db, AppState};

/// GET /api/projects/{id}/plan
///
/// Returns the stored plan when one exists; otherwise generates one from
/// the project's current state (or a minimal fallback context when the
/// project row is absent), stores it, and returns it.
///
/// Concurrent generations for the same project are serialized by a
/// per-project lock; the request that loses the race observes the stored
/// plan after acquiring the lock and returns it without a second LLM call.
pub async fn get_or_generate_plan(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = aipm_common::ids::parse(&project_id)?;

    if let Some(existing) = db::plans::get_plan(&state.db, &project_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        info!(%project_id, "Returning existing plan");
        return Ok(Json(plan_body(&existing)?));
    }

    let lock = state.plan_lock(&project_id).await;
    let _guard = lock.lock().await;

    // Re-check under the lock: a concurrent request may have generated the
    // plan while this one was waiting.
    if let Some(existing) = db::plans::get_plan(&state.db, &project_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        info!(%project_id, "Plan generated by a concurrent request");
        return Ok(Json(plan_body(&existing)?));
    }

    let context = match db::projects::get_project(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        Some(project) => ProjectContext::from_project(&project),
        None => ProjectContext::fallback(&project_id),
    };

    let synthesizer =
        PlanSynthesizer::with_retry_policy(state.llm.clone(), state.retry_policy.clone());
    let plan = synthesizer.generate_plan(&state.db, &context).await?;

    Ok(Json(plan_body(&plan)?))
}

fn plan_body(plan: &crate::models::PlanDocument) -> ApiResult<Value> {
    serde_json::to_value(plan).map_err(|e| ApiError::Internal(e.to_string()))
}

/// POST /api/refine-tasks/{id}
///
/// Refines the stored plan's high-level tasks (or a seed task when no
/// plan exists yet) into subtasks. The project itself must exist.
pub async fn refine_project_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<RefinementResult>> {
    let id = aipm_common::ids::parse(&project_id)?;

    let project = db::projects::get_project(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No project found with ID: {}. Please create a project first.",
                project_id
            ))
        })?;

    let existing_plan = db::plans::get_plan(&state.db, &project_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let tasks_to_refine = match existing_plan {
        Some(plan) if plan.high_level_tasks.is_array() => plan.high_level_tasks,
        _ => json!([
            {
                "task_name": "Project Setup",
                "description": format!("Initial setup for {}", project.title),
                "dependencies": []
            }
        ]),
    };

    let lock = state.plan_lock(&project_id).await;
    let _guard = lock.lock().await;

    let refiner = TaskRefiner::with_retry_policy(state.llm.clone(), state.retry_policy.clone());
    let result = refiner
        .refine_tasks(&state.db, &project_id, tasks_to_refine)
        .await?;

    Ok(Json(result))
}

/// Build planning routes
pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects/:project_id/plan", get(get_or_generate_plan))
        .route("/api/refine-tasks/:project_id", post(refine_project_tasks))
}
