// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Project endpoints.

use axum::extract::{Path, State};
use serde_json::{json, Map, Value};

use taskdeck_domain::entities::{ActionKind, EntityKind, Project};
use taskdeck_domain::CoreError;

use crate::application::drafts::ActionInput;
use crate::presentation::http::direct;
use crate::presentation::http::envelope::{ok, ApiResult, AppJson};
use crate::presentation::http::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    ok(state.store.list_projects().await?)
}

pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Project> {
    let project = state
        .store
        .get_project(&id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("project {} not found", id)))?;
    ok(project)
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> ApiResult<Value> {
    let outcome = direct::apply_single_action(
        &state,
        ActionInput {
            entity_type: EntityKind::Project,
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
        .ok_or_else(|| CoreError::internal_error("project create emitted no audit entry"))?;
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
            entity_type: EntityKind::Project,
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
        .ok_or_else(|| CoreError::internal_error("project update emitted no audit entry"))?;
    ok(updated)
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let outcome = direct::apply_single_action(
        &state,
        ActionInput {
            entity_type: EntityKind::Project,
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
