//! aipm-planner library interface
//!
//! Exposes `AppState` and `build_router` so integration tests can drive
//! the full HTTP surface against an in-memory store and a mock LLM client.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod planner;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::llm::{ChatClient, RetryPolicy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, established once at startup
    pub db: SqlitePool,
    /// Long-lived LLM client, shared by every request
    pub llm: Arc<dyn ChatClient>,
    /// Retry policy for LLM calls
    pub retry_policy: RetryPolicy,
    /// Per-project locks serializing concurrent plan generation
    plan_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, llm: Arc<dyn ChatClient>) -> Self {
        Self {
            db,
            llm,
            retry_policy: RetryPolicy::default(),
            plan_locks: Arc::new(Mutex::new(HashMap::new())),
            startup_time: Utc::now(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Lock guarding plan generation/refinement for one project id.
    ///
    /// Duplicate concurrent generation requests would each pay for an LLM
    /// call and race on the upsert; serializing per project lets the loser
    /// observe the stored plan instead.
    pub async fn plan_lock(&self, project_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.plan_locks.lock().await;
        // Entries whose only reference is the map itself have no holder
        // left; drop them so the map stays bounded by in-flight requests.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn plan_lock_count(&self) -> usize {
        self.plan_locks.lock().await.len()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::info_routes())
        .merge(api::project_routes())
        .merge(api::plan_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockChatClient;

    async fn test_state() -> AppState {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        AppState::new(pool, Arc::new(MockChatClient::new(vec![])))
    }

    #[tokio::test]
    async fn plan_lock_serializes_same_project() {
        let state = test_state().await;
        let lock = state.plan_lock("proj-1").await;
        let _guard = lock.lock().await;

        let same = state.plan_lock("proj-1").await;
        assert!(same.try_lock().is_err());
    }

    #[tokio::test]
    async fn released_plan_locks_are_evicted() {
        let state = test_state().await;

        let held = state.plan_lock("held").await;
        let _guard = held.lock().await;

        drop(state.plan_lock("released").await);
        assert_eq!(state.plan_lock_count().await, 2);

        // Next acquisition sweeps the entry nobody holds anymore; the
        // held entry survives.
        let other = state.plan_lock("other").await;
        assert_eq!(state.plan_lock_count().await, 2);
        assert!(held.try_lock().is_err());
        assert!(other.try_lock().is_ok());
    }
}
