// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Audit-log endpoints: search, detail with field diff, rollback.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use taskdeck_domain::entities::{Actor, AuditAction, AuditEntry, EntityKind};
use taskdeck_domain::services::state_diff::{diff_states, DiffEntry};
use taskdeck_domain::CoreError;

use crate::infrastructure::persistence::{AuditFilter, Page};
use crate::presentation::http::drafts::ActorBody;
use crate::presentation::http::envelope::{ok, ApiResult, AppJson};
use crate::presentation::http::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListQuery {
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub actor: Option<String>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub q: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl AuditListQuery {
    fn into_filter(self) -> Result<AuditFilter, CoreError> {
        Ok(AuditFilter {
            project_id: self.project_id,
            task_id: self.task_id,
            actor: self
                .actor
                .as_deref()
                .map(|raw| Actor::parse(raw.trim().to_ascii_lowercase().as_str()))
                .transpose()?,
            action: self
                .action
                .as_deref()
                .map(|raw| AuditAction::parse(raw.trim().to_ascii_lowercase().as_str()))
                .transpose()?,
            entity_type: self
                .entity_type
                .as_deref()
                .map(|raw| EntityKind::parse(raw.trim().to_ascii_lowercase().as_str()))
                .transpose()?,
            q: self.q,
            from: self.from,
            to: self.to,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

/// Audit detail: the entry plus its computed field-level diff.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetail {
    pub entry: AuditEntry,
    pub diff: Vec<DiffEntry>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AuditListQuery>,
) -> ApiResult<Page<AuditEntry>> {
    ok(state.store.list_audit(&query.into_filter()?).await?)
}

pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<AuditDetail> {
    let entry = state
        .store
        .get_audit(&id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("audit entry {} not found", id)))?;
    let diff = diff_states(entry.before.as_ref(), entry.after.as_ref());
    ok(AuditDetail { entry, diff })
}

pub async fn rollback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ActorBody>,
) -> ApiResult<AuditEntry> {
    ok(state.changes.rollback_audit(&id, body.actor).await?)
}
