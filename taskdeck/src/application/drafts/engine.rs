// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Draft Engine
//!
//! Accepts a batch of proposed actions, sanitizes and validates it, and
//! persists it as a pending draft. Hard errors are limited to structure:
//! an empty batch, a missing `entityId` on update/delete, a missing `after`
//! on create/update. Everything else becomes warnings that ride along on
//! the draft row for later review.
//!
//! Discard also lives here; apply is the change engine's job.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use taskdeck_domain::entities::draft::DraftAction;
use taskdeck_domain::entities::{ActionKind, Actor, Draft, EntityKind};
use taskdeck_domain::services::sanitize;
use taskdeck_domain::{CoreError, RecordId};

use crate::application::drafts::validation;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::persistence::SqliteStore;

/// One proposed action as submitted by a caller. Discriminators are typed,
/// so an unknown `entityType` or `action` is rejected at deserialization -
/// the structural hard-error boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInput {
    pub entity_type: EntityKind,
    pub action: ActionKind,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub after: Option<Map<String, Value>>,
}

/// Submission payload for `POST /api/drafts` and the in-process callers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDraft {
    #[serde(default)]
    pub project_id: Option<String>,
    pub created_by: Actor,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionInput>,
}

/// Outcome of a submission: the persisted pending draft plus the warnings
/// collected across all actions.
#[derive(Debug, Clone)]
pub struct SubmittedDraft {
    pub draft: Draft,
    pub warnings: Vec<String>,
}

pub struct DraftEngine {
    store: Arc<SqliteStore>,
    metrics: Arc<MetricsService>,
}

impl DraftEngine {
    pub fn new(store: Arc<SqliteStore>, metrics: Arc<MetricsService>) -> Self {
        Self { store, metrics }
    }

    /// Validates and persists a batch of proposed actions as one pending
    /// draft, returning it with its warnings.
    pub async fn submit(&self, request: SubmitDraft) -> Result<SubmittedDraft, CoreError> {
        if request.actions.is_empty() {
            return Err(CoreError::validation("draft requires at least one action"));
        }
        let project_id = request
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(RecordId::parse)
            .transpose()?;

        let mut warnings = Vec::new();
        let mut actions = Vec::with_capacity(request.actions.len());
        for input in request.actions {
            let action = self.build_action(input, &mut warnings)?;
            actions.push(action);
        }

        let soft = validation::collect_warnings(
            &*self.store,
            &*self.store,
            project_id.as_ref().map(RecordId::as_str),
            &mut actions,
        )
        .await?;
        warnings.extend(soft);

        let draft = Draft::new(
            project_id,
            request.created_by,
            request.reason,
            actions,
            warnings.clone(),
            Utc::now(),
        )?;
        self.store.insert_draft(&draft).await?;
        self.metrics.drafts_submitted.inc();
        info!(
            draft_id = %draft.id,
            actions = draft.actions.len(),
            warnings = warnings.len(),
            created_by = draft.created_by.as_str(),
            "Draft submitted"
        );

        Ok(SubmittedDraft { draft, warnings })
    }

    /// Sanitizes one action input into its persisted form, labeling any
    /// coercion issues as warnings.
    fn build_action(
        &self,
        input: ActionInput,
        warnings: &mut Vec<String>,
    ) -> Result<DraftAction, CoreError> {
        let entity_id = input
            .entity_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let mut issues = Vec::new();
        let after = match (input.action, input.after) {
            (ActionKind::Delete, _) | (_, None) => None,
            (_, Some(raw)) => {
                let sanitized = match input.entity_type {
                    EntityKind::Project => sanitize::project_fields(&raw),
                    EntityKind::Task => sanitize::task_fields(&raw),
                };
                issues = sanitized.issues;
                Some(sanitized.fields)
            }
        };

        let action = DraftAction {
            id: RecordId::generate(),
            entity_type: input.entity_type,
            action: input.action,
            entity_id,
            after,
        };
        if !issues.is_empty() {
            let label = action.label();
            for issue in issues {
                warnings.push(format!("{}: {}", label, issue));
            }
        }
        debug!(
            entity_type = action.entity_type.as_str(),
            action = action.action.as_str(),
            "Sanitized draft action"
        );
        action.validate_shape()?;
        Ok(action)
    }

    /// `pending -> discarded`. Idempotent when already discarded; conflict
    /// when applied.
    pub async fn discard(&self, draft_id: &str) -> Result<Draft, CoreError> {
        let mut draft = self
            .store
            .get_draft(draft_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("draft {} not found", draft_id)))?;
        let changed = draft.mark_discarded()?;
        if changed {
            self.store.update_draft_status(&draft).await?;
            self.metrics.drafts_discarded.inc();
            info!(draft_id = %draft.id, "Draft discarded");
        }
        Ok(draft)
    }
}
