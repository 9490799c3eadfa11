//! Task refinement pipeline
//!
//! Expands high-level tasks into subtasks. The refined array replaces the
//! plan's task list wholesale; no field-level merge and no version history.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::repair::extract_json_array;
use super::PlannerError;
use crate::db;
use crate::llm::{complete_with_retry, ChatClient, ChatRequest, RetryPolicy};
use crate::models::{PlanDocument, RefinementResult};

const REFINE_SYSTEM_PROMPT: &str = "You are a technical project management AI specializing in task breakdown and estimation. \
Your output must be VALID JSON ONLY with no additional text.";

/// Refines high-level tasks into subtasks via the LLM.
pub struct TaskRefiner {
    llm: Arc<dyn ChatClient>,
    retry: RetryPolicy,
}

impl TaskRefiner {
    pub fn new(llm: Arc<dyn ChatClient>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(llm: Arc<dyn ChatClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    /// Refine the given tasks and upsert the result into the project's
    /// plan. When no plan exists yet, a minimal one is seeded in memory
    /// from the supplied tasks and only persisted once refinement succeeds.
    pub async fn refine_tasks(
        &self,
        pool: &SqlitePool,
        project_id: &str,
        tasks: Value,
    ) -> Result<RefinementResult, PlannerError> {
        let mut plan = match db::plans::get_plan(pool, project_id).await? {
            Some(plan) => plan,
            None => {
                warn!(%project_id, "No existing plan found; seeding a minimal one");
                let now = Utc::now();
                PlanDocument {
                    project_id: project_id.to_string(),
                    project_summary: json!(""),
                    key_features_deliverables: json!([]),
                    major_milestones: json!([]),
                    high_level_tasks: tasks.clone(),
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let prompt = build_refine_prompt(&tasks);

        info!(%project_id, "Refining project tasks");
        let response = complete_with_retry(
            self.llm.as_ref(),
            ChatRequest::with_system(REFINE_SYSTEM_PROMPT, prompt),
            &self.retry,
        )
        .await?;
        debug!(len = response.len(), "Received refinement response");

        let sliced = extract_json_array(&response);
        let refined_tasks: Value = serde_json::from_str(sliced)
            .map_err(|e| PlannerError::MalformedRefinementResponse(e.to_string()))?;

        // Wholesale replacement of the task list
        plan.high_level_tasks = refined_tasks.clone();
        plan.updated_at = Utc::now();
        db::plans::store_plan(pool, &plan).await?;
        info!(%project_id, "Refined tasks stored");

        Ok(RefinementResult {
            project_id: project_id.to_string(),
            refined_tasks,
            original_tasks: tasks,
        })
    }
}

fn build_refine_prompt(tasks: &Value) -> String {
    let tasks_str = serde_json::to_string_pretty(tasks).unwrap_or_else(|_| tasks.to_string());

    format!(
        r#"Given these high-level tasks:

{tasks_str}

Break them down into subtasks following these rules:
1. Create 2-4 subtasks for each high-level task
2. Each subtask must have:
   - Descriptive name
   - Detailed description
   - Effort estimate in story points or days
   - Specific technical requirements
3. Preserve the original task information
4. Return ONLY valid JSON array

Return your response in this EXACT JSON structure:
[
    {{
        "task_name": "name from original task",
        "description": "description from original task",
        "dependencies": ["dependencies from original task"],
        "subtasks": [
            {{
                "name": "specific subtask name",
                "description": "detailed subtask description",
                "effort": "effort estimate",
                "technical_requirements": ["specific requirement 1", "specific requirement 2"]
            }}
        ]
    }}
]
"#
    )
}
