//! Request/response and record types for the planner service
//!
//! Projects are document-flexible records: the scalar columns are typed,
//! the nested lists (team, sprints, timeline, resources) are serde structs
//! persisted as JSON text. Plan content produced by the LLM is carried as
//! raw `serde_json::Value` so field presence can be validated without
//! imposing structure the provider never promised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Team member entry on a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub avatar: String,
}

/// Sprint entry on a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub name: String,
    pub progress: f64,
    pub status: String,
}

/// Timeline event entry on a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub date: DateTime<Utc>,
}

/// Resource profile attached to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub profile: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Stored project record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub document: String,
    pub status: String,
    pub tasks: Vec<String>,
    pub progress: f64,
    pub team: Vec<TeamMember>,
    pub sprints: Vec<Sprint>,
    pub timeline: Vec<TimelineEvent>,
    pub resources: Vec<Resource>,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project record annotated with plan existence, for list responses
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListEntry {
    #[serde(flatten)]
    pub project: Project,
    pub has_plan: bool,
}

/// Payload for creating a project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreate {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub document: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Owning-user reference - opaque id or free string
    pub user: String,
}

fn default_status() -> String {
    "planning".to_string()
}

/// Partial-update payload: only supplied fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub document: Option<String>,
    pub status: Option<String>,
    pub tasks: Option<Vec<String>>,
    pub progress: Option<f64>,
    pub team: Option<Vec<TeamMember>>,
    pub sprints: Option<Vec<Sprint>>,
    pub timeline: Option<Vec<TimelineEvent>>,
    pub resources: Option<Vec<Resource>>,
}

impl ProjectUpdate {
    /// True when no field was supplied at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.tags.is_none()
            && self.document.is_none()
            && self.status.is_none()
            && self.tasks.is_none()
            && self.progress.is_none()
            && self.team.is_none()
            && self.sprints.is_none()
            && self.timeline.is_none()
            && self.resources.is_none()
    }
}

/// Plan document: the four LLM-produced fields plus timestamps.
///
/// Field contents are trusted as-is; only presence is validated when the
/// document is assembled from an LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    pub project_id: String,
    pub project_summary: Value,
    pub key_features_deliverables: Value,
    pub major_milestones: Value,
    pub high_level_tasks: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a task-refinement run
#[derive(Debug, Clone, Serialize)]
pub struct RefinementResult {
    pub project_id: String,
    pub refined_tasks: Value,
    pub original_tasks: Value,
}
