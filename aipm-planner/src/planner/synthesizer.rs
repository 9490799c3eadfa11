//! Plan synthesis pipeline

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use super::repair::extract_json_object;
use super::{PlannerError, REQUIRED_PLAN_FIELDS};
use crate::db;
use crate::llm::{complete_with_retry, ChatClient, ChatRequest, RetryPolicy};
use crate::models::{PlanDocument, Project};

/// Project attributes embedded into the planning prompt.
///
/// Absent fields default to neutral placeholders so a plan can be
/// synthesized even for a project the store has never seen.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub team_size: usize,
    pub progress: f64,
    pub tags: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl ProjectContext {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            title: project.title.clone(),
            description: project.description.clone(),
            status: project.status.clone(),
            team_size: project.team.len(),
            progress: project.progress,
            tags: project.tags.clone(),
            deadline: project.deadline,
        }
    }

    /// Minimal context for a well-formed id with no stored project
    pub fn fallback(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: "Untitled Project".to_string(),
            description: "Project details to be determined".to_string(),
            status: "planning".to_string(),
            team_size: 0,
            progress: 0.0,
            tags: Vec::new(),
            deadline: None,
        }
    }
}

/// Generates project plans: prompt -> LLM -> repair -> validate -> store.
pub struct PlanSynthesizer {
    llm: Arc<dyn ChatClient>,
    retry: RetryPolicy,
}

impl PlanSynthesizer {
    pub fn new(llm: Arc<dyn ChatClient>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(llm: Arc<dyn ChatClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    /// Generate a plan for the given context and persist it keyed by the
    /// project id. Returns the stored plan document.
    pub async fn generate_plan(
        &self,
        pool: &SqlitePool,
        context: &ProjectContext,
    ) -> Result<PlanDocument, PlannerError> {
        let prompt = build_plan_prompt(context);

        info!(project_id = %context.id, "Generating project plan");
        let response = complete_with_retry(
            self.llm.as_ref(),
            ChatRequest::user(prompt),
            &self.retry,
        )
        .await?;
        debug!(len = response.len(), "Received plan response");

        let plan_json = parse_plan_response(&response)?;

        let now = Utc::now();
        let plan = PlanDocument {
            project_id: context.id.clone(),
            project_summary: plan_json["project_summary"].clone(),
            key_features_deliverables: plan_json["key_features_deliverables"].clone(),
            major_milestones: plan_json["major_milestones"].clone(),
            high_level_tasks: plan_json["high_level_tasks"].clone(),
            created_at: now,
            updated_at: now,
        };

        db::plans::store_plan(pool, &plan).await?;
        info!(project_id = %context.id, "Plan generated and stored");

        Ok(plan)
    }
}

/// Repair, parse, and presence-validate a plan response.
///
/// Field contents are trusted as-is; only the presence of the four
/// required top-level fields is checked.
fn parse_plan_response(response: &str) -> Result<Value, PlannerError> {
    let sliced = extract_json_object(response);
    let plan_json: Value = serde_json::from_str(sliced)
        .map_err(|e| PlannerError::MalformedPlanResponse(e.to_string()))?;

    let missing: Vec<String> = REQUIRED_PLAN_FIELDS
        .iter()
        .filter(|field| plan_json.get(**field).is_none())
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PlannerError::IncompletePlan { missing });
    }

    Ok(plan_json)
}

/// Fixed instruction template directing the model to emit pure JSON
fn build_plan_prompt(context: &ProjectContext) -> String {
    let deadline = context
        .deadline
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        r#"You are a project planning AI assistant. You MUST respond with ONLY valid JSON - no other text before or after.

Project Details:
Title: {title}
Description: {description}
Status: {status}
Team Size: {team_size} members
Current Progress: {progress}%
Tags: {tags}
Deadline: {deadline}

Generate a project plan in this EXACT JSON structure:
{{
    "project_summary": "<detailed overview>",
    "key_features_deliverables": [
        "<feature 1>",
        "<feature 2>",
        "<feature 3>"
    ],
    "major_milestones": [
        {{
            "name": "<milestone name>",
            "timeline": "<timeline>"
        }}
    ],
    "high_level_tasks": [
        {{
            "task_name": "<task name>",
            "description": "<description>",
            "dependencies": [],
            "estimated_duration": "<duration>"
        }}
    ]
}}

IMPORTANT:
1. Respond ONLY with valid JSON
2. Include 3-5 key features
3. Include 4-6 milestones
4. Include 5-8 tasks
5. NO placeholders - use real content based on the project details
6. NO text before or after the JSON
7. Ensure all JSON syntax is valid
"#,
        title = context.title,
        description = context.description,
        status = context.status,
        team_size = context.team_size,
        progress = context.progress,
        tags = context.tags.join(", "),
        deadline = deadline,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockChatClient;
    use crate::llm::LlmError;
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn full_plan_json() -> String {
        json!({
            "project_summary": "Redesign the website",
            "key_features_deliverables": ["New landing page", "CMS", "Analytics"],
            "major_milestones": [{"name": "Design complete", "timeline": "Week 2"}],
            "high_level_tasks": [
                {"task_name": "Audit", "description": "Review current site", "dependencies": []}
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn wrapped_response_is_repaired_and_stored() {
        let pool = test_pool().await;
        let response = format!("Sure! Here is your plan:\n{}\nGood luck!", full_plan_json());
        let client = Arc::new(MockChatClient::replying(response));
        let synthesizer =
            PlanSynthesizer::with_retry_policy(client.clone(), fast_retry());

        let context = ProjectContext::fallback("proj-1");
        let plan = synthesizer.generate_plan(&pool, &context).await.unwrap();

        assert_eq!(plan.project_summary, json!("Redesign the website"));
        assert_eq!(client.call_count(), 1);

        let stored = db::plans::get_plan(&pool, "proj-1").await.unwrap().unwrap();
        assert_eq!(stored.high_level_tasks, plan.high_level_tasks);
    }

    #[tokio::test]
    async fn response_without_json_is_malformed() {
        let pool = test_pool().await;
        let client = Arc::new(MockChatClient::replying("I cannot plan this project."));
        let synthesizer = PlanSynthesizer::with_retry_policy(client, fast_retry());

        let result = synthesizer
            .generate_plan(&pool, &ProjectContext::fallback("proj-2"))
            .await;

        assert!(matches!(result, Err(PlannerError::MalformedPlanResponse(_))));
        assert!(db::plans::get_plan(&pool, "proj-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_named_exactly() {
        let pool = test_pool().await;
        let partial = json!({
            "project_summary": "s",
            "high_level_tasks": []
        })
        .to_string();
        let client = Arc::new(MockChatClient::replying(partial));
        let synthesizer = PlanSynthesizer::with_retry_policy(client, fast_retry());

        let result = synthesizer
            .generate_plan(&pool, &ProjectContext::fallback("proj-3"))
            .await;

        match result {
            Err(PlannerError::IncompletePlan { missing }) => {
                assert_eq!(
                    missing,
                    vec!["key_features_deliverables", "major_milestones"]
                );
            }
            other => panic!("expected IncompletePlan, got {:?}", other.map(|p| p.project_id)),
        }
    }

    #[tokio::test]
    async fn empty_lists_still_count_as_present() {
        let pool = test_pool().await;
        let sparse = json!({
            "project_summary": "",
            "key_features_deliverables": [],
            "major_milestones": [],
            "high_level_tasks": []
        })
        .to_string();
        let client = Arc::new(MockChatClient::replying(sparse));
        let synthesizer = PlanSynthesizer::with_retry_policy(client, fast_retry());

        let plan = synthesizer
            .generate_plan(&pool, &ProjectContext::fallback("proj-4"))
            .await
            .unwrap();
        assert_eq!(plan.key_features_deliverables, json!([]));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_through_the_pipeline() {
        let pool = test_pool().await;
        let client = Arc::new(MockChatClient::new(vec![
            Err(LlmError::RateLimited),
            Err(LlmError::RateLimited),
            Ok(full_plan_json()),
        ]));
        let synthesizer =
            PlanSynthesizer::with_retry_policy(client.clone(), fast_retry());

        let plan = synthesizer
            .generate_plan(&pool, &ProjectContext::fallback("proj-5"))
            .await
            .unwrap();

        assert_eq!(client.call_count(), 3);
        assert_eq!(plan.project_id, "proj-5");
    }

    #[test]
    fn prompt_embeds_context_and_defaults() {
        let context = ProjectContext {
            id: "p".to_string(),
            title: "Website Redesign".to_string(),
            description: "Refresh the brand".to_string(),
            status: "planning".to_string(),
            team_size: 3,
            progress: 40.0,
            tags: vec!["web".to_string(), "design".to_string()],
            deadline: None,
        };
        let prompt = build_plan_prompt(&context);
        assert!(prompt.contains("Title: Website Redesign"));
        assert!(prompt.contains("Team Size: 3 members"));
        assert!(prompt.contains("Tags: web, design"));
        assert!(prompt.contains("Deadline: Not specified"));
    }
}
