// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Seed
//!
//! Inserts a small demo project with three tasks so a fresh install has
//! something to look at. Seeding is idempotent: rows are keyed by fixed ids
//! and inserted only when absent, and a marker in `seed_meta` records that
//! the seed ran. Safe to call on every startup.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use taskdeck_domain::entities::{Project, Task, TaskPriority, TaskStatus};
use taskdeck_domain::{CoreError, RecordId};

use super::store;

const SEED_KEY: &str = "demo_seed";
const SEED_VERSION: &str = "v1";

const PROJECT_ID: &str = "demo-project";

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::database_error(format!("seed failed: {}", e))
}

/// Inserts the demo rows if they are not already present.
pub async fn ensure_demo_data(pool: &SqlitePool) -> Result<(), CoreError> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    let marker: Option<String> =
        sqlx::query_scalar("SELECT value FROM seed_meta WHERE key = ?")
            .bind(SEED_KEY)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
    if marker.is_some() {
        debug!("Demo seed already present, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let project_id = RecordId::parse(PROJECT_ID)?;

    if store::get_project_row(&mut tx, PROJECT_ID).await?.is_none() {
        let project = Project {
            id: project_id.clone(),
            name: "Website Relaunch".into(),
            description: Some("Demo project seeded on first start".into()),
            icon: Some("rocket".into()),
            created_at: now,
        };
        store::insert_project(&mut tx, &project).await?;
    }

    let tasks = [
        ("demo-task-1", "Information architecture", "1.1", TaskStatus::Done, 100, vec![]),
        ("demo-task-2", "Visual design", "1.2", TaskStatus::InProgress, 40, vec!["1.1".to_string()]),
        ("demo-task-3", "Content migration", "1.3", TaskStatus::Todo, 0, vec!["demo-task-2".to_string()]),
    ];
    for (offset, (id, title, wbs, status, completion, predecessors)) in tasks.into_iter().enumerate()
    {
        if store::get_task_row(&mut tx, id).await?.is_some() {
            continue;
        }
        let task = Task {
            id: RecordId::parse(id)?,
            project_id: project_id.clone(),
            title: title.into(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            created_at: now + chrono::Duration::milliseconds(offset as i64),
            start_date: None,
            due_date: None,
            completion,
            assignee: None,
            wbs: Some(wbs.into()),
            is_milestone: false,
            predecessors,
        };
        store::insert_task(&mut tx, &task).await?;
    }

    sqlx::query("INSERT INTO seed_meta (key, value, created_at) VALUES (?, ?, ?)")
        .bind(SEED_KEY)
        .bind(SEED_VERSION)
        .bind(now.timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;
    info!("Seeded demo project '{}'", PROJECT_ID);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::schema;
    use crate::infrastructure::persistence::SqliteStore;

    #[tokio::test]
    async fn seeding_twice_inserts_once() {
        let pool = schema::initialize_database("sqlite::memory:").await.unwrap();
        ensure_demo_data(&pool).await.unwrap();
        ensure_demo_data(&pool).await.unwrap();

        let store = SqliteStore::new(pool);
        let projects = store.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        let tasks = store
            .list_tasks(&Default::default())
            .await
            .unwrap();
        assert_eq!(tasks.total, 3);
    }
}
