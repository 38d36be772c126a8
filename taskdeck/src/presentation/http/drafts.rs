// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Draft endpoints: submit, inspect, apply, discard.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use taskdeck_domain::entities::{Actor, Draft, DraftStatus};
use taskdeck_domain::CoreError;

use crate::application::drafts::SubmitDraft;
use crate::infrastructure::persistence::DraftFilter;
use crate::presentation::http::envelope::{ok, ApiResult, AppJson};
use crate::presentation::http::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftListQuery {
    pub status: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub draft: Draft,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub draft: Draft,
    pub audit_entry_ids: Vec<String>,
}

/// Body of apply/rollback calls: who is acting.
#[derive(Debug, Deserialize)]
pub struct ActorBody {
    pub actor: Actor,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DraftListQuery>,
) -> ApiResult<Vec<Draft>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(DraftStatus::parse(raw.trim().to_ascii_lowercase().as_str())?),
        None => None,
    };
    let drafts = state
        .store
        .list_drafts(&DraftFilter {
            status,
            project_id: query.project_id,
        })
        .await?;
    ok(drafts)
}

pub async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Draft> {
    let draft = state
        .store
        .get_draft(&id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("draft {} not found", id)))?;
    ok(draft)
}

pub async fn submit(
    State(state): State<AppState>,
    AppJson(body): AppJson<SubmitDraft>,
) -> ApiResult<SubmitResponse> {
    let submitted = state.drafts.submit(body).await?;
    ok(SubmitResponse {
        draft: submitted.draft,
        warnings: submitted.warnings,
    })
}

pub async fn apply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ActorBody>,
) -> ApiResult<ApplyResponse> {
    let outcome = state.changes.apply_draft(&id, body.actor).await?;
    ok(ApplyResponse {
        draft: outcome.draft,
        audit_entry_ids: outcome
            .entries
            .iter()
            .map(|entry| entry.id.to_string())
            .collect(),
    })
}

pub async fn discard(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Draft> {
    ok(state.drafts.discard(&id).await?)
}
