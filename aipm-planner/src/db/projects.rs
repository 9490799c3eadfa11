//! Project record persistence

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Project, ProjectCreate, ProjectListEntry, ProjectUpdate};

/// Create a new project record.
///
/// Embedded references (task ids, owning user) are normalized
/// opportunistically: parseable UUIDs are canonicalized, anything else is
/// kept verbatim. `created_at` and `updated_at` are stamped identically.
pub async fn create_project(pool: &SqlitePool, input: ProjectCreate) -> Result<Project> {
    let now = Utc::now();
    let project = Project {
        id: aipm_common::ids::generate().to_string(),
        title: input.title,
        description: input.description,
        deadline: input.deadline,
        tags: input.tags,
        document: input.document,
        status: input.status,
        tasks: input
            .tasks
            .iter()
            .map(|t| aipm_common::ids::normalize(t))
            .collect(),
        progress: input.progress,
        team: input.team,
        sprints: input.sprints,
        timeline: input.timeline,
        resources: input.resources,
        user: aipm_common::ids::normalize(&input.user),
        created_at: now,
        updated_at: now,
    };

    insert_project(pool, &project).await?;

    Ok(project)
}

async fn insert_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO projects (
            id, title, description, deadline, tags, document, status, tasks,
            progress, team, sprints, timeline, resources, user,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.deadline.map(|d| d.to_rfc3339()))
    .bind(serde_json::to_string(&project.tags)?)
    .bind(&project.document)
    .bind(&project.status)
    .bind(serde_json::to_string(&project.tasks)?)
    .bind(project.progress)
    .bind(serde_json::to_string(&project.team)?)
    .bind(serde_json::to_string(&project.sprints)?)
    .bind(serde_json::to_string(&project.timeline)?)
    .bind(serde_json::to_string(&project.resources)?)
    .bind(&project.user)
    .bind(project.created_at.to_rfc3339())
    .bind(project.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a project by id; `None` when absent
pub async fn get_project(pool: &SqlitePool, id: Uuid) -> Result<Option<Project>> {
    let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| project_from_row(&r)).transpose()
}

/// Apply a partial update, refreshing `updated_at`.
///
/// Only supplied fields change; returns the post-update record or `None`
/// when the project does not exist.
pub async fn update_project(
    pool: &SqlitePool,
    id: Uuid,
    update: ProjectUpdate,
) -> Result<Option<Project>> {
    let Some(mut project) = get_project(pool, id).await? else {
        return Ok(None);
    };

    if let Some(title) = update.title {
        project.title = title;
    }
    if let Some(description) = update.description {
        project.description = description;
    }
    if let Some(deadline) = update.deadline {
        project.deadline = Some(deadline);
    }
    if let Some(tags) = update.tags {
        project.tags = tags;
    }
    if let Some(document) = update.document {
        project.document = document;
    }
    if let Some(status) = update.status {
        project.status = status;
    }
    if let Some(tasks) = update.tasks {
        project.tasks = tasks.iter().map(|t| aipm_common::ids::normalize(t)).collect();
    }
    if let Some(progress) = update.progress {
        project.progress = progress;
    }
    if let Some(team) = update.team {
        project.team = team;
    }
    if let Some(sprints) = update.sprints {
        project.sprints = sprints;
    }
    if let Some(timeline) = update.timeline {
        project.timeline = timeline;
    }
    if let Some(resources) = update.resources {
        project.resources = resources;
    }
    project.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE projects SET
            title = ?, description = ?, deadline = ?, tags = ?, document = ?,
            status = ?, tasks = ?, progress = ?, team = ?, sprints = ?,
            timeline = ?, resources = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.deadline.map(|d| d.to_rfc3339()))
    .bind(serde_json::to_string(&project.tags)?)
    .bind(&project.document)
    .bind(&project.status)
    .bind(serde_json::to_string(&project.tasks)?)
    .bind(project.progress)
    .bind(serde_json::to_string(&project.team)?)
    .bind(serde_json::to_string(&project.sprints)?)
    .bind(serde_json::to_string(&project.timeline)?)
    .bind(serde_json::to_string(&project.resources)?)
    .bind(project.updated_at.to_rfc3339())
    .bind(&project.id)
    .execute(pool)
    .await?;

    Ok(Some(project))
}

/// Soft-delete a project: status becomes "deleted", `updated_at` refreshes.
///
/// Idempotent - deleting an already-deleted project succeeds again with a
/// fresh `updated_at`. The record remains queryable.
pub async fn soft_delete_project(pool: &SqlitePool, id: Uuid) -> Result<Option<Project>> {
    update_project(
        pool,
        id,
        ProjectUpdate {
            status: Some("deleted".to_string()),
            ..Default::default()
        },
    )
    .await
}

/// List all projects (soft-deleted included), each annotated with a derived
/// `has_plan` flag from the plans table.
pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<ProjectListEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT p.*,
               EXISTS(SELECT 1 FROM project_plans pl WHERE pl.project_id = p.id) AS has_plan
        FROM projects p
        ORDER BY p.created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let has_plan: i64 = row.get("has_plan");
            Ok(ProjectListEntry {
                project: project_from_row(row)?,
                has_plan: has_plan != 0,
            })
        })
        .collect()
}

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    let deadline: Option<String> = row.get("deadline");

    Ok(Project {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        deadline: deadline.as_deref().map(parse_timestamp).transpose()?,
        tags: serde_json::from_str(row.get("tags")).context("tags column")?,
        document: row.get("document"),
        status: row.get("status"),
        tasks: serde_json::from_str(row.get("tasks")).context("tasks column")?,
        progress: row.get("progress"),
        team: serde_json::from_str(row.get("team")).context("team column")?,
        sprints: serde_json::from_str(row.get("sprints")).context("sprints column")?,
        timeline: serde_json::from_str(row.get("timeline")).context("timeline column")?,
        resources: serde_json::from_str(row.get("resources")).context("resources column")?,
        user: row.get("user"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectCreate;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn sample_create(title: &str) -> ProjectCreate {
        ProjectCreate {
            title: title.to_string(),
            description: "A project".to_string(),
            deadline: None,
            tags: vec![],
            document: String::new(),
            status: "planning".to_string(),
            tasks: vec![],
            progress: 0.0,
            team: vec![],
            sprints: vec![],
            timeline: vec![],
            resources: vec![],
            user: "owner-1".to_string(),
        }
    }

    #[tokio::test]
    async fn creation_stamps_equal_timestamps() {
        let pool = test_pool().await;
        let project = create_project(&pool, sample_create("Website Redesign"))
            .await
            .unwrap();

        assert_eq!(project.created_at, project.updated_at);
        assert_eq!(project.status, "planning");
        assert_eq!(project.progress, 0.0);

        let loaded = get_project(&pool, aipm_common::ids::parse(&project.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.created_at, project.created_at);
    }

    #[tokio::test]
    async fn partial_update_touches_only_supplied_fields() {
        let pool = test_pool().await;
        let project = create_project(&pool, sample_create("Website Redesign"))
            .await
            .unwrap();
        let id = aipm_common::ids::parse(&project.id).unwrap();

        let updated = update_project(
            &pool,
            id,
            ProjectUpdate {
                progress: Some(40.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.progress, 40.0);
        assert_eq!(updated.title, "Website Redesign");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn soft_delete_is_idempotent() {
        let pool = test_pool().await;
        let project = create_project(&pool, sample_create("Doomed"))
            .await
            .unwrap();
        let id = aipm_common::ids::parse(&project.id).unwrap();

        let first = soft_delete_project(&pool, id).await.unwrap().unwrap();
        assert_eq!(first.status, "deleted");

        let second = soft_delete_project(&pool, id).await.unwrap().unwrap();
        assert_eq!(second.status, "deleted");
        assert!(second.updated_at >= first.updated_at);

        // still retrievable after deletion
        assert!(get_project(&pool, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_of_missing_project_returns_none() {
        let pool = test_pool().await;
        let missing = update_project(
            &pool,
            aipm_common::ids::generate(),
            ProjectUpdate {
                title: Some("ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn embedded_ids_normalize_opportunistically() {
        let pool = test_pool().await;
        let mut input = sample_create("Refs");
        input.tasks = vec![
            "67E55044-10B1-426F-9247-BB680E5FE0C8".to_string(),
            "jira-1234".to_string(),
        ];
        let project = create_project(&pool, input).await.unwrap();

        assert_eq!(project.tasks[0], "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(project.tasks[1], "jira-1234");
        assert_eq!(project.user, "owner-1");
    }
}
