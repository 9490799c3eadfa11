//! Plan record persistence
//!
//! At most one plan row per project id. Writes are upserts: `updated_at`
//! is always refreshed, `created_at` is first-write-wins.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use crate::db::projects::parse_timestamp;
use crate::models::PlanDocument;

/// Upsert a plan keyed by project id.
///
/// On conflict the original `created_at` is preserved; everything else is
/// replaced. Idempotent, so a crash between generation and storage is
/// recovered by re-issuing the generation call.
pub async fn store_plan(pool: &SqlitePool, plan: &PlanDocument) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO project_plans (
            project_id, project_summary, key_features_deliverables,
            major_milestones, high_level_tasks, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(project_id) DO UPDATE SET
            project_summary = excluded.project_summary,
            key_features_deliverables = excluded.key_features_deliverables,
            major_milestones = excluded.major_milestones,
            high_level_tasks = excluded.high_level_tasks,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&plan.project_id)
    .bind(serde_json::to_string(&plan.project_summary)?)
    .bind(serde_json::to_string(&plan.key_features_deliverables)?)
    .bind(serde_json::to_string(&plan.major_milestones)?)
    .bind(serde_json::to_string(&plan.high_level_tasks)?)
    .bind(plan.created_at.to_rfc3339())
    .bind(plan.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the stored plan for a project, if any
pub async fn get_plan(pool: &SqlitePool, project_id: &str) -> Result<Option<PlanDocument>> {
    let row = sqlx::query(
        r#"
        SELECT project_id, project_summary, key_features_deliverables,
               major_milestones, high_level_tasks, created_at, updated_at
        FROM project_plans
        WHERE project_id = ?
        "#,
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(PlanDocument {
            project_id: row.get("project_id"),
            project_summary: serde_json::from_str(row.get("project_summary"))
                .context("project_summary column")?,
            key_features_deliverables: serde_json::from_str(row.get("key_features_deliverables"))
                .context("key_features_deliverables column")?,
            major_milestones: serde_json::from_str(row.get("major_milestones"))
                .context("major_milestones column")?,
            high_level_tasks: serde_json::from_str(row.get("high_level_tasks"))
                .context("high_level_tasks column")?,
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn sample_plan(project_id: &str) -> PlanDocument {
        let now = Utc::now();
        PlanDocument {
            project_id: project_id.to_string(),
            project_summary: json!("Build the thing"),
            key_features_deliverables: json!(["feature a", "feature b"]),
            major_milestones: json!([{"name": "MVP", "timeline": "Q1"}]),
            high_level_tasks: json!([{"task_name": "Setup", "description": "init", "dependencies": []}]),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_preserves_created_at() {
        let pool = test_pool().await;
        let first = sample_plan("proj-1");
        store_plan(&pool, &first).await.unwrap();

        let mut second = sample_plan("proj-1");
        second.project_summary = json!("Rebuild the thing");
        second.created_at = Utc::now();
        second.updated_at = second.created_at;
        store_plan(&pool, &second).await.unwrap();

        let stored = get_plan(&pool, "proj-1").await.unwrap().unwrap();
        assert_eq!(stored.project_summary, json!("Rebuild the thing"));
        // first-write-wins creation time, refreshed update time
        assert_eq!(
            stored.created_at.to_rfc3339(),
            first.created_at.to_rfc3339()
        );
        assert_eq!(
            stored.updated_at.to_rfc3339(),
            second.updated_at.to_rfc3339()
        );
    }

    #[tokio::test]
    async fn missing_plan_is_none() {
        let pool = test_pool().await;
        assert!(get_plan(&pool, "nope").await.unwrap().is_none());
    }
}
