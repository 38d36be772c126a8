// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Store
//!
//! Typed row access for the five tables. The store exposes two surfaces:
//!
//! - pool-level reads and single-row writes on [`SqliteStore`], used by the
//!   HTTP facade, the draft engine, and the read tools;
//! - connection-scoped row functions (`insert_task`, `delete_project`, ...)
//!   that the change engine composes inside one transaction, so a draft
//!   apply either lands whole or not at all.
//!
//! List queries assemble their WHERE clause dynamically and bind every
//! value; nothing user-controlled is ever interpolated into SQL. Task
//! listing orders by `created_at ASC, id ASC`; audit listing by
//! `timestamp DESC, seq DESC` (seq is the insertion-order tie-break).

use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Row, SqlitePool};

use taskdeck_domain::entities::{
    Actor, AuditAction, AuditEntry, Draft, DraftStatus, EntityKind, Project, Task, TaskStatus,
};
use taskdeck_domain::repositories::{ProjectReader, TaskReader, TaskRefs};
use taskdeck_domain::CoreError;

use super::serializer;

fn db_err(context: &str) -> impl FnOnce(sqlx::Error) -> CoreError + '_ {
    move |e| CoreError::database_error(format!("{}: {}", context, e))
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Filter for task listings.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
    /// Case-insensitive substring over title and description.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Filter for audit-log listings.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub actor: Option<Actor>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<EntityKind>,
    /// Case-insensitive substring over entity id and reason.
    pub q: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Filter for draft listings.
#[derive(Debug, Clone, Default)]
pub struct DraftFilter {
    pub status: Option<DraftStatus>,
    pub project_id: Option<String>,
}

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

fn page_bounds(page: Option<u32>, page_size: Option<u32>) -> (u32, u32, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let limit = i64::from(page_size);
    let offset = i64::from(page - 1) * limit;
    (page, page_size, limit, offset)
}

/// Escapes LIKE wildcards and lowercases; used with `ESCAPE '\'`.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

enum Arg {
    Text(String),
    Int(i64),
}

fn bind_args<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    args: &'q [Arg],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for arg in args {
        query = match arg {
            Arg::Text(s) => query.bind(s.as_str()),
            Arg::Int(i) => query.bind(*i),
        };
    }
    query
}

/// Pool-owning store over the five core tables.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---- projects -------------------------------------------------------

    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, CoreError> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("query project"))?;
        row.as_ref().map(serializer::project_from_row).transpose()
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, CoreError> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list projects"))?;
        rows.iter().map(serializer::project_from_row).collect()
    }

    // ---- tasks ----------------------------------------------------------

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, CoreError> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("query task"))?;
        row.as_ref().map(serializer::task_from_row).transpose()
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Page<Task>, CoreError> {
        let mut clause = String::from(" FROM tasks WHERE 1=1");
        let mut args: Vec<Arg> = Vec::new();

        if let Some(project_id) = &filter.project_id {
            clause.push_str(" AND project_id = ?");
            args.push(Arg::Text(project_id.clone()));
        }
        if let Some(status) = filter.status {
            clause.push_str(" AND status = ?");
            args.push(Arg::Text(status.as_str().to_string()));
        }
        if let Some(assignee) = &filter.assignee {
            clause.push_str(" AND assignee = ?");
            args.push(Arg::Text(assignee.clone()));
        }
        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            clause.push_str(
                " AND (lower(title) LIKE ? ESCAPE '\\' \
                 OR lower(coalesce(description, '')) LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(q.trim());
            args.push(Arg::Text(pattern.clone()));
            args.push(Arg::Text(pattern));
        }

        let count_sql = format!("SELECT COUNT(*){}", clause);
        let total: i64 = bind_args(sqlx::query(&count_sql), &args)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("count tasks"))?
            .try_get(0)
            .map_err(db_err("count tasks"))?;

        let (page, page_size, limit, offset) = page_bounds(filter.page, filter.page_size);
        let select_sql = format!(
            "SELECT *{} ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
            clause
        );
        args.push(Arg::Int(limit));
        args.push(Arg::Int(offset));
        let rows = bind_args(sqlx::query(&select_sql), &args)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list tasks"))?;

        Ok(Page {
            data: rows
                .iter()
                .map(serializer::task_from_row)
                .collect::<Result<_, _>>()?,
            total,
            page,
            page_size,
        })
    }

    // ---- drafts ---------------------------------------------------------

    pub async fn get_draft(&self, id: &str) -> Result<Option<Draft>, CoreError> {
        let row = sqlx::query("SELECT * FROM drafts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("query draft"))?;
        row.as_ref().map(serializer::draft_from_row).transpose()
    }

    pub async fn list_drafts(&self, filter: &DraftFilter) -> Result<Vec<Draft>, CoreError> {
        let mut sql = String::from("SELECT * FROM drafts WHERE 1=1");
        let mut args: Vec<Arg> = Vec::new();
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Arg::Text(status.as_str().to_string()));
        }
        if let Some(project_id) = &filter.project_id {
            sql.push_str(" AND project_id = ?");
            args.push(Arg::Text(project_id.clone()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        let rows = bind_args(sqlx::query(&sql), &args)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list drafts"))?;
        rows.iter().map(serializer::draft_from_row).collect()
    }

    pub async fn insert_draft(&self, draft: &Draft) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO drafts \
             (id, project_id, created_by, status, reason, actions, warnings, created_at, applied_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.id.as_str())
        .bind(draft.project_id.as_ref().map(|id| id.as_str()))
        .bind(draft.created_by.as_str())
        .bind(draft.status.as_str())
        .bind(draft.reason.as_deref())
        .bind(serializer::to_json_text(&draft.actions)?)
        .bind(serializer::to_json_text(&draft.warnings)?)
        .bind(draft.created_at.timestamp_millis())
        .bind(draft.applied_at.map(|at| at.timestamp_millis()))
        .execute(&self.pool)
        .await
        .map_err(db_err("insert draft"))?;
        Ok(())
    }

    pub async fn update_draft_status(&self, draft: &Draft) -> Result<(), CoreError> {
        let mut conn = self.pool.acquire().await.map_err(db_err("acquire"))?;
        set_draft_status(&mut conn, draft).await
    }

    // ---- audit ----------------------------------------------------------

    pub async fn get_audit(&self, id: &str) -> Result<Option<AuditEntry>, CoreError> {
        let row = sqlx::query("SELECT * FROM audit_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("query audit entry"))?;
        row.as_ref().map(serializer::audit_from_row).transpose()
    }

    pub async fn list_audit(&self, filter: &AuditFilter) -> Result<Page<AuditEntry>, CoreError> {
        let mut clause = String::from(" FROM audit_logs WHERE 1=1");
        let mut args: Vec<Arg> = Vec::new();

        if let Some(project_id) = &filter.project_id {
            clause.push_str(" AND project_id = ?");
            args.push(Arg::Text(project_id.clone()));
        }
        if let Some(task_id) = &filter.task_id {
            clause.push_str(" AND entity_type = 'task' AND entity_id = ?");
            args.push(Arg::Text(task_id.clone()));
        }
        if let Some(actor) = filter.actor {
            clause.push_str(" AND actor = ?");
            args.push(Arg::Text(actor.as_str().to_string()));
        }
        if let Some(action) = filter.action {
            clause.push_str(" AND action = ?");
            args.push(Arg::Text(action.as_str().to_string()));
        }
        if let Some(entity_type) = filter.entity_type {
            clause.push_str(" AND entity_type = ?");
            args.push(Arg::Text(entity_type.as_str().to_string()));
        }
        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            clause.push_str(
                " AND (lower(entity_id) LIKE ? ESCAPE '\\' \
                 OR lower(coalesce(reason, '')) LIKE ? ESCAPE '\\')",
            );
            let pattern = like_pattern(q.trim());
            args.push(Arg::Text(pattern.clone()));
            args.push(Arg::Text(pattern));
        }
        if let Some(from) = filter.from {
            clause.push_str(" AND timestamp >= ?");
            args.push(Arg::Int(from));
        }
        if let Some(to) = filter.to {
            clause.push_str(" AND timestamp <= ?");
            args.push(Arg::Int(to));
        }

        let count_sql = format!("SELECT COUNT(*){}", clause);
        let total: i64 = bind_args(sqlx::query(&count_sql), &args)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("count audit entries"))?
            .try_get(0)
            .map_err(db_err("count audit entries"))?;

        let (page, page_size, limit, offset) = page_bounds(filter.page, filter.page_size);
        let select_sql = format!(
            "SELECT *{} ORDER BY timestamp DESC, seq DESC LIMIT ? OFFSET ?",
            clause
        );
        args.push(Arg::Int(limit));
        args.push(Arg::Int(offset));
        let rows = bind_args(sqlx::query(&select_sql), &args)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("list audit entries"))?;

        Ok(Page {
            data: rows
                .iter()
                .map(serializer::audit_from_row)
                .collect::<Result<_, _>>()?,
            total,
            page,
            page_size,
        })
    }
}

#[async_trait]
impl ProjectReader for SqliteStore {
    async fn find_project(&self, id: &str) -> Result<Option<Project>, CoreError> {
        self.get_project(id).await
    }
}

#[async_trait]
impl TaskReader for SqliteStore {
    async fn find_task(&self, id: &str) -> Result<Option<Task>, CoreError> {
        self.get_task(id).await
    }

    async fn task_refs(&self) -> Result<TaskRefs, CoreError> {
        let rows = sqlx::query("SELECT id, wbs FROM tasks")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("collect task refs"))?;
        let mut refs = TaskRefs::default();
        for row in &rows {
            let id: String = row.try_get("id").map_err(db_err("collect task refs"))?;
            refs.insert_id(id);
            let wbs: Option<String> = row.try_get("wbs").map_err(db_err("collect task refs"))?;
            if let Some(code) = wbs {
                refs.insert_wbs(code);
            }
        }
        Ok(refs)
    }
}

// ---- connection-scoped row operations -----------------------------------
//
// These compose inside one transaction: the change engine passes `&mut *tx`
// so every row touched by a draft apply shares the same commit.

pub async fn get_project_row(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Project>, CoreError> {
    let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("query project"))?;
    row.as_ref().map(serializer::project_from_row).transpose()
}

pub async fn insert_project(
    conn: &mut SqliteConnection,
    project: &Project,
) -> Result<(), CoreError> {
    sqlx::query(
        "INSERT INTO projects (id, name, description, icon, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(project.id.as_str())
    .bind(&project.name)
    .bind(project.description.as_deref())
    .bind(project.icon.as_deref())
    .bind(project.created_at.timestamp_millis())
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            CoreError::conflict(format!("project {} already exists", project.id))
        }
        other => CoreError::database_error(format!("insert project: {}", other)),
    })?;
    Ok(())
}

pub async fn update_project(
    conn: &mut SqliteConnection,
    project: &Project,
) -> Result<(), CoreError> {
    let result = sqlx::query("UPDATE projects SET name = ?, description = ?, icon = ? WHERE id = ?")
        .bind(&project.name)
        .bind(project.description.as_deref())
        .bind(project.icon.as_deref())
        .bind(project.id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(db_err("update project"))?;
    if result.rows_affected() == 0 {
        return Err(CoreError::not_found(format!(
            "project {} not found",
            project.id
        )));
    }
    Ok(())
}

pub async fn delete_project_row(conn: &mut SqliteConnection, id: &str) -> Result<bool, CoreError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err("delete project"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_task_row(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Task>, CoreError> {
    let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("query task"))?;
    row.as_ref().map(serializer::task_from_row).transpose()
}

pub async fn tasks_of_project(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<Vec<Task>, CoreError> {
    let rows = sqlx::query("SELECT * FROM tasks WHERE project_id = ? ORDER BY created_at ASC, id ASC")
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("list project tasks"))?;
    rows.iter().map(serializer::task_from_row).collect()
}

pub async fn count_project_tasks(
    conn: &mut SqliteConnection,
    project_id: &str,
) -> Result<i64, CoreError> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err("count project tasks"))
}

pub async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> Result<(), CoreError> {
    sqlx::query(
        "INSERT INTO tasks \
         (id, project_id, title, description, status, priority, created_at, start_date, \
          due_date, completion, assignee, wbs, is_milestone, predecessors) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(task.id.as_str())
    .bind(task.project_id.as_str())
    .bind(&task.title)
    .bind(task.description.as_deref())
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.created_at.timestamp_millis())
    .bind(task.start_date.map(|at| at.timestamp_millis()))
    .bind(task.due_date.map(|at| at.timestamp_millis()))
    .bind(task.completion)
    .bind(task.assignee.as_deref())
    .bind(task.wbs.as_deref())
    .bind(task.is_milestone)
    .bind(serializer::to_json_text(&task.predecessors)?)
    .execute(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            CoreError::conflict(format!("task {} already exists", task.id))
        }
        other => CoreError::database_error(format!("insert task: {}", other)),
    })?;
    Ok(())
}

pub async fn update_task(conn: &mut SqliteConnection, task: &Task) -> Result<(), CoreError> {
    let result = sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, \
         start_date = ?, due_date = ?, completion = ?, assignee = ?, wbs = ?, \
         is_milestone = ?, predecessors = ? WHERE id = ?",
    )
    .bind(&task.title)
    .bind(task.description.as_deref())
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.start_date.map(|at| at.timestamp_millis()))
    .bind(task.due_date.map(|at| at.timestamp_millis()))
    .bind(task.completion)
    .bind(task.assignee.as_deref())
    .bind(task.wbs.as_deref())
    .bind(task.is_milestone)
    .bind(serializer::to_json_text(&task.predecessors)?)
    .bind(task.id.as_str())
    .execute(&mut *conn)
    .await
    .map_err(db_err("update task"))?;
    if result.rows_affected() == 0 {
        return Err(CoreError::not_found(format!("task {} not found", task.id)));
    }
    Ok(())
}

pub async fn delete_task_row(conn: &mut SqliteConnection, id: &str) -> Result<bool, CoreError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_err("delete task"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_draft_row(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Draft>, CoreError> {
    let row = sqlx::query("SELECT * FROM drafts WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err("query draft"))?;
    row.as_ref().map(serializer::draft_from_row).transpose()
}

pub async fn set_draft_status(conn: &mut SqliteConnection, draft: &Draft) -> Result<(), CoreError> {
    let result = sqlx::query("UPDATE drafts SET status = ?, applied_at = ? WHERE id = ?")
        .bind(draft.status.as_str())
        .bind(draft.applied_at.map(|at| at.timestamp_millis()))
        .bind(draft.id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(db_err("update draft status"))?;
    if result.rows_affected() == 0 {
        return Err(CoreError::not_found(format!("draft {} not found", draft.id)));
    }
    Ok(())
}

pub async fn insert_audit(conn: &mut SqliteConnection, entry: &AuditEntry) -> Result<(), CoreError> {
    sqlx::query(
        "INSERT INTO audit_logs \
         (id, project_id, entity_type, entity_id, action, actor, before_state, after_state, \
          reason, timestamp, source_draft_id, rollback_of_audit_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.id.as_str())
    .bind(entry.project_id.as_ref().map(|id| id.as_str()))
    .bind(entry.entity_type.as_str())
    .bind(&entry.entity_id)
    .bind(entry.action.as_str())
    .bind(entry.actor.as_str())
    .bind(entry.before.as_ref().map(serializer::to_json_text).transpose()?)
    .bind(entry.after.as_ref().map(serializer::to_json_text).transpose()?)
    .bind(entry.reason.as_deref())
    .bind(entry.timestamp.timestamp_millis())
    .bind(entry.source_draft_id.as_ref().map(|id| id.as_str()))
    .bind(entry.rollback_of_audit_id.as_ref().map(|id| id.as_str()))
    .execute(&mut *conn)
    .await
    .map_err(db_err("insert audit entry"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::schema;
    use chrono::{DateTime, Utc};
    use taskdeck_domain::entities::TaskPriority;
    use taskdeck_domain::RecordId;

    async fn store() -> SqliteStore {
        let pool = schema::initialize_database("sqlite::memory:").await.unwrap();
        SqliteStore::new(pool)
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    async fn seed_project(store: &SqliteStore, id: &str, name: &str) -> Project {
        let project = Project {
            id: RecordId::parse(id).unwrap(),
            name: name.into(),
            description: None,
            icon: None,
            created_at: at(1_000),
        };
        let mut conn = store.pool().acquire().await.unwrap();
        insert_project(&mut conn, &project).await.unwrap();
        project
    }

    async fn seed_task(store: &SqliteStore, id: &str, project: &str, title: &str, ms: i64) -> Task {
        let task = Task {
            id: RecordId::parse(id).unwrap(),
            project_id: RecordId::parse(project).unwrap(),
            title: title.into(),
            description: Some(format!("{} description", title)),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            created_at: at(ms),
            start_date: None,
            due_date: None,
            completion: 0,
            assignee: None,
            wbs: None,
            is_milestone: false,
            predecessors: vec![],
        };
        let mut conn = store.pool().acquire().await.unwrap();
        insert_task(&mut conn, &task).await.unwrap();
        task
    }

    #[tokio::test]
    async fn task_rows_round_trip() {
        let store = store().await;
        seed_project(&store, "p1", "Alpha").await;
        let mut task = seed_task(&store, "t1", "p1", "Foundations", 2_000).await;
        task.predecessors = vec!["1.1".into()];
        task.status = TaskStatus::InProgress;
        {
            let mut conn = store.pool().acquire().await.unwrap();
            update_task(&mut conn, &task).await.unwrap();
        }

        let read = store.get_task("t1").await.unwrap().unwrap();
        assert_eq!(read, task);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = store().await;
        seed_project(&store, "p1", "Alpha").await;
        let project = Project {
            id: RecordId::parse("p1").unwrap(),
            name: "Alpha again".into(),
            description: None,
            icon: None,
            created_at: at(1_000),
        };
        let mut conn = store.pool().acquire().await.unwrap();
        let err = insert_project(&mut conn, &project).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_tasks_filters_and_paginates() {
        let store = store().await;
        seed_project(&store, "p1", "Alpha").await;
        seed_project(&store, "p2", "Beta").await;
        for i in 0..5 {
            seed_task(&store, &format!("a{}", i), "p1", &format!("alpha work {}", i), 1_000 + i).await;
        }
        seed_task(&store, "b0", "p2", "beta work", 9_000).await;

        let page = store
            .list_tasks(&TaskFilter {
                project_id: Some("p1".into()),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].id.as_str(), "a0");

        let second = store
            .list_tasks(&TaskFilter {
                project_id: Some("p1".into()),
                page: Some(2),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second.data[0].id.as_str(), "a2");
    }

    #[tokio::test]
    async fn q_matches_title_and_description_case_insensitively() {
        let store = store().await;
        seed_project(&store, "p1", "Alpha").await;
        seed_task(&store, "t1", "p1", "Pour FOUNDATION", 1_000).await;
        seed_task(&store, "t2", "p1", "Roofing", 2_000).await;

        let page = store
            .list_tasks(&TaskFilter {
                q: Some("foundation".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id.as_str(), "t1");

        // Wildcards in the needle are literals, not patterns.
        let none = store
            .list_tasks(&TaskFilter {
                q: Some("%".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(none.total, 0);
    }

    #[tokio::test]
    async fn task_refs_cover_ids_and_wbs() {
        let store = store().await;
        seed_project(&store, "p1", "Alpha").await;
        let mut task = seed_task(&store, "t1", "p1", "x", 1_000).await;
        task.wbs = Some("1.2".into());
        {
            let mut conn = store.pool().acquire().await.unwrap();
            update_task(&mut conn, &task).await.unwrap();
        }
        let refs = store.task_refs().await.unwrap();
        assert!(refs.contains("t1"));
        assert!(refs.contains("1.2"));
        assert!(!refs.contains("2.1"));
    }
}
