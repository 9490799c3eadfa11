//! Plan synthesis and task refinement
//!
//! Both pipelines share the same shape: render a fixed instruction
//! template, call the LLM through the `ChatClient` seam, repair the
//! response text into a JSON payload, validate it, and upsert the result
//! through the persistence gateway. Failures are a typed error union so
//! callers can statically distinguish success from failure.

pub mod refiner;
pub mod repair;
pub mod synthesizer;

pub use refiner::TaskRefiner;
pub use synthesizer::{PlanSynthesizer, ProjectContext};

use thiserror::Error;

use crate::llm::LlmError;

/// The four top-level fields every generated plan must carry
pub const REQUIRED_PLAN_FIELDS: [&str; 4] = [
    "project_summary",
    "key_features_deliverables",
    "major_milestones",
    "high_level_tasks",
];

/// Errors from the plan-generation and task-refinement pipelines
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Provider failure, after the retry policy has been exhausted
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// Plan response was not parseable JSON even after repair
    #[error("Malformed plan response: {0}")]
    MalformedPlanResponse(String),

    /// Refinement response was not a parseable JSON array even after repair
    #[error("Malformed refinement response: {0}")]
    MalformedRefinementResponse(String),

    /// Plan parsed but is missing required top-level fields
    #[error("Plan is missing required fields: {}", missing.join(", "))]
    IncompletePlan { missing: Vec<String> },

    /// Persistence failure while storing the result
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}
