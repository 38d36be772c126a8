// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Task endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use taskdeck_domain::entities::{ActionKind, EntityKind, Task, TaskStatus};
use taskdeck_domain::CoreError;

use crate::application::drafts::ActionInput;
use crate::infrastructure::persistence::{Page, TaskFilter};
use crate::presentation::http::direct;
use crate::presentation::http::envelope::{ok, ApiResult, AppJson};
use crate::presentation::http::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl TaskListQuery {
    fn into_filter(self) -> Result<TaskFilter, CoreError> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(
                TaskStatus::parse_loose(raw)
                    .ok_or_else(|| CoreError::validation(format!("unknown status '{}'", raw)))?,
            ),
            None => None,
        };
        Ok(TaskFilter {
            project_id: self.project_id,
            status,
            assignee: self.assignee,
            q: self.q,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Page<Task>> {
    ok(state.store.list_tasks(&query.into_filter()?).await?)
}

pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Task> {
    let task = state
        .store
        .get_task(&id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("task {} not found", id)))?;
    ok(task)
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResult<Value> {
    let outcome = direct::apply_single_action(
        &state,
        ActionInput {
            entity_type: EntityKind::Task,
            action: ActionKind::Create,
            entity_id: None,
            after: Some(body),
        },
    )
    .await?;
    let created = outcome
        .entries
        .first()
        .and_then(|entry| entry.after.clone())
        .ok_or_else(|| CoreError::internal_error("task create emitted no audit entry"))?;
    ok(created)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResult<Value> {
    let outcome = direct::apply_single_action(
        &state,
        ActionInput {
            entity_type: EntityKind::Task,
            action: ActionKind::Update,
            entity_id: Some(id),
            after: Some(body),
        },
    )
    .await?;
    let updated = outcome
        .entries
        .first()
        .and_then(|entry| entry.after.clone())
        .ok_or_else(|| CoreError::internal_error("task update emitted no audit entry"))?;
    ok(updated)
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let outcome = direct::apply_single_action(
        &state,
        ActionInput {
            entity_type: EntityKind::Task,
            action: ActionKind::Delete,
            entity_id: Some(id.clone()),
            after: None,
        },
    )
    .await?;
    ok(json!({
        "id": id,
        "deleted": true,
        "auditEntries": outcome.entries.len(),
    }))
}
