//! Database access for the planner service
//!
//! Two collections: project records and plan records keyed by project id.
//! Document-flexible fields live in JSON text columns.

pub mod plans;
pub mod projects;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the projects and project_plans tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            deadline TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            document TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'planning',
            tasks TEXT NOT NULL DEFAULT '[]',
            progress REAL NOT NULL DEFAULT 0.0,
            team TEXT NOT NULL DEFAULT '[]',
            sprints TEXT NOT NULL DEFAULT '[]',
            timeline TEXT NOT NULL DEFAULT '[]',
            resources TEXT NOT NULL DEFAULT '[]',
            user TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_plans (
            project_id TEXT PRIMARY KEY,
            project_summary TEXT NOT NULL,
            key_features_deliverables TEXT NOT NULL,
            major_milestones TEXT NOT NULL,
            high_level_tasks TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (projects, project_plans)");

    Ok(())
}
