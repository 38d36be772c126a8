// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Soft Draft Validation
//!
//! Referential and consistency checks over a sanitized action batch. Every
//! finding here is a warning, never a rejection: the agent is a noisy
//! source, and the whole point of drafts is to surface risks for human
//! review instead of bouncing plans. Only structural problems (wrong
//! discriminators, missing `after`) are hard errors, and those are caught
//! before this module runs.
//!
//! The checks, in order:
//!
//! 1. duplicate entity ids within the batch itself
//! 2. update/delete targets that do not exist right now
//! 3. task creates with no resolvable project (the draft's own `projectId`
//!    is used as the fallback and written into the action)
//! 4. due date before start date, evaluated on the merged view
//! 5. predecessor references that match neither a current task id/WBS nor a
//!    WBS introduced earlier in the same batch

use std::collections::HashSet;

use serde_json::Value;

use taskdeck_domain::entities::draft::DraftAction;
use taskdeck_domain::entities::{ActionKind, EntityKind};
use taskdeck_domain::repositories::{ProjectReader, TaskReader};
use taskdeck_domain::CoreError;

/// Runs all soft checks, filling fallback project ids in place and
/// returning the collected warnings.
pub async fn collect_warnings(
    projects: &dyn ProjectReader,
    tasks: &dyn TaskReader,
    draft_project_id: Option<&str>,
    actions: &mut [DraftAction],
) -> Result<Vec<String>, CoreError> {
    let mut warnings = Vec::new();

    duplicate_ids(actions, &mut warnings);

    // Locators a predecessor may point at: everything persisted, plus WBS
    // codes (and explicit ids) introduced by creates earlier in the batch.
    let mut refs = tasks.task_refs().await?;
    for action in actions.iter() {
        if action.entity_type == EntityKind::Task && action.action == ActionKind::Create {
            if let Some(id) = action.entity_id.as_deref() {
                refs.insert_id(id);
            }
            if let Some(code) = action
                .after
                .as_ref()
                .and_then(|after| after.get("wbs"))
                .and_then(Value::as_str)
            {
                refs.insert_wbs(code);
            }
        }
    }

    for action in actions.iter_mut() {
        let label = action.label();

        if matches!(action.action, ActionKind::Update | ActionKind::Delete) {
            if let Some(id) = action.entity_id.as_deref() {
                let exists = match action.entity_type {
                    EntityKind::Project => projects.project_exists(id).await?,
                    EntityKind::Task => tasks.find_task(id).await?.is_some(),
                };
                if !exists {
                    warnings.push(format!(
                        "entity {}/{} not found; action may fail at apply time",
                        action.entity_type.as_str(),
                        id
                    ));
                }
            }
        }

        if action.entity_type != EntityKind::Task {
            continue;
        }

        match action.action {
            ActionKind::Create => {
                let Some(after) = action.after.as_mut() else {
                    continue;
                };
                let has_project = after
                    .get("projectId")
                    .and_then(Value::as_str)
                    .is_some_and(|id| !id.trim().is_empty());
                if !has_project {
                    match draft_project_id {
                        Some(pid) => {
                            after.insert("projectId".into(), Value::String(pid.to_string()));
                        }
                        None => warnings.push("task create missing projectId".into()),
                    }
                }
                if let Some(pid) = after
                    .get("projectId")
                    .and_then(Value::as_str)
                    .filter(|pid| !pid.trim().is_empty())
                {
                    if !projects.project_exists(pid).await? {
                        warnings.push(format!(
                            "entity project/{} not found; action may fail at apply time",
                            pid
                        ));
                    }
                }
                let start = after.get("startDate").and_then(Value::as_i64);
                let due = after.get("dueDate").and_then(Value::as_i64);
                if let (Some(start), Some(due)) = (start, due) {
                    if due < start {
                        warnings.push(format!("{}: due before start", label));
                    }
                }
            }
            ActionKind::Update => {
                let Some(after) = action.after.as_ref() else {
                    continue;
                };
                let Some(id) = action.entity_id.as_deref() else {
                    continue;
                };
                if let Some(current) = tasks.find_task(id).await? {
                    match current.merged_with(after) {
                        Ok(merged) => {
                            if merged.dates_inverted() {
                                warnings.push(format!("{}: due before start", label));
                            }
                        }
                        Err(e) => warnings.push(format!("{}: {}", label, e)),
                    }
                }
            }
            ActionKind::Delete => {}
        }

        if let Some(predecessors) = action
            .after
            .as_ref()
            .and_then(|after| after.get("predecessors"))
            .and_then(Value::as_array)
        {
            let missing: Vec<&str> = predecessors
                .iter()
                .filter_map(Value::as_str)
                .filter(|reference| !refs.contains(reference))
                .collect();
            if !missing.is_empty() {
                warnings.push(format!(
                    "{}: unknown predecessors: {}",
                    label,
                    missing.join(", ")
                ));
            }
        }
    }

    Ok(warnings)
}

fn duplicate_ids(actions: &[DraftAction], warnings: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for action in actions {
        if let Some(id) = action.entity_id.as_deref() {
            if !seen.insert(id) && reported.insert(id) {
                warnings.push(format!("duplicate entity id {} across actions", id));
            }
        }
    }
}
