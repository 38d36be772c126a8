// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Inverse rollback: one audit entry per call, snapshot restoration, and
//! the append-only discipline around rollback entries.

#[allow(dead_code)]
mod common;

use serde_json::json;

use taskdeck_domain::entities::{Actor, AuditAction, DraftStatus};
use taskdeck_domain::CoreError;

use common::{submit_json, test_state};
use taskdeck::presentation::http::AppState;

async fn apply(state: &AppState, body: serde_json::Value) -> taskdeck::application::changes::ApplyOutcome {
    let submitted = submit_json(state, body).await;
    state
        .changes
        .apply_draft(submitted.draft.id.as_str(), Actor::User)
        .await
        .unwrap()
}

async fn project(state: &AppState, name: &str) -> String {
    apply(
        state,
        json!({
            "createdBy": "user",
            "actions": [{"entityType": "project", "action": "create", "after": {"name": name}}]
        }),
    )
    .await
    .entries[0]
        .entity_id
        .clone()
}

async fn task(state: &AppState, project: &str, title: &str) -> String {
    apply(
        state,
        json!({
            "projectId": project,
            "createdBy": "user",
            "actions": [{"entityType": "task", "action": "create", "after": {"title": title}}]
        }),
    )
    .await
    .entries[0]
        .entity_id
        .clone()
}

#[tokio::test]
async fn rollback_of_update_restores_the_before_snapshot() {
    let state = test_state().await;
    let project_id = project(&state, "Alpha").await;
    let task_id = task(&state, &project_id, "Foundations").await;

    let update = apply(
        &state,
        json!({
            "createdBy": "user",
            "actions": [{
                "entityType": "task",
                "action": "update",
                "entityId": task_id,
                "after": {"status": "DONE", "completion": 100}
            }]
        }),
    )
    .await;
    let update_entry = &update.entries[0];

    let rollback = state
        .changes
        .rollback_audit(update_entry.id.as_str(), Actor::User)
        .await
        .unwrap();

    assert_eq!(rollback.action, AuditAction::Rollback);
    assert_eq!(
        rollback.rollback_of_audit_id.as_ref(),
        Some(&update_entry.id)
    );
    assert_eq!(rollback.before, update_entry.after);
    assert_eq!(rollback.after, update_entry.before);

    // The row equals the original before snapshot.
    let restored = state.store.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&restored).unwrap(),
        update_entry.before.clone().unwrap()
    );
    assert_eq!(restored.status.as_str(), "TODO");
    assert_eq!(restored.completion, 0);
}

#[tokio::test]
async fn rollback_entries_are_terminal() {
    let state = test_state().await;
    let project_id = project(&state, "Alpha").await;
    let task_id = task(&state, &project_id, "x").await;

    let update = apply(
        &state,
        json!({
            "createdBy": "user",
            "actions": [{
                "entityType": "task", "action": "update", "entityId": task_id,
                "after": {"completion": 50}
            }]
        }),
    )
    .await;
    let rollback = state
        .changes
        .rollback_audit(update.entries[0].id.as_str(), Actor::User)
        .await
        .unwrap();

    let err = state
        .changes
        .rollback_audit(rollback.id.as_str(), Actor::User)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn rollback_of_create_deletes_and_detects_missing_target() {
    let state = test_state().await;
    let project_id = project(&state, "Alpha").await;
    let create = apply(
        &state,
        json!({
            "projectId": project_id,
            "createdBy": "user",
            "actions": [{"entityType": "task", "action": "create", "after": {"title": "x"}}]
        }),
    )
    .await;
    let entry_id = create.entries[0].id.to_string();
    let task_id = create.entries[0].entity_id.clone();

    let rollback = state
        .changes
        .rollback_audit(&entry_id, Actor::User)
        .await
        .unwrap();
    assert!(state.store.get_task(&task_id).await.unwrap().is_none());
    assert!(rollback.after.is_none());

    // The entity is already gone now: a second rollback of the same create
    // conflicts.
    let err = state
        .changes
        .rollback_audit(&entry_id, Actor::User)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn rollback_of_delete_reinserts_and_detects_collisions() {
    let state = test_state().await;
    let project_id = project(&state, "Alpha").await;
    let task_id = task(&state, &project_id, "Foundations").await;

    let delete = apply(
        &state,
        json!({
            "createdBy": "user",
            "actions": [{"entityType": "task", "action": "delete", "entityId": task_id}]
        }),
    )
    .await;
    let entry_id = delete.entries[0].id.to_string();

    let rollback = state
        .changes
        .rollback_audit(&entry_id, Actor::Agent)
        .await
        .unwrap();
    assert_eq!(rollback.actor, Actor::Agent);

    // Restored under the original id with the original fields.
    let restored = state.store.get_task(&task_id).await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&restored).unwrap(),
        delete.entries[0].before.clone().unwrap()
    );

    // Restoring again collides with the row that now exists.
    let err = state
        .changes
        .rollback_audit(&entry_id, Actor::User)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn project_create_rollback_refuses_while_tasks_exist() {
    let state = test_state().await;
    let create = apply(
        &state,
        json!({
            "createdBy": "user",
            "actions": [{"entityType": "project", "action": "create", "after": {"name": "Alpha"}}]
        }),
    )
    .await;
    let project_id = create.entries[0].entity_id.clone();
    let entry_id = create.entries[0].id.to_string();
    task(&state, &project_id, "occupant").await;

    let err = state
        .changes
        .rollback_audit(&entry_id, Actor::User)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(state.store.get_project(&project_id).await.unwrap().is_some());
}

#[tokio::test]
async fn reverse_order_rollback_round_trips_the_database() {
    let state = test_state().await;
    let project_id = project(&state, "Alpha").await;
    let task_id = task(&state, &project_id, "Foundations").await;

    // Capture the pre-submission state of both tables.
    let projects_before = state.store.list_projects().await.unwrap();
    let tasks_before = state.store.list_tasks(&Default::default()).await.unwrap().data;

    // One draft, three actions: create a sibling, update the existing task,
    // then delete the sibling's predecessor-free companion path.
    let outcome = apply(
        &state,
        json!({
            "projectId": project_id,
            "createdBy": "agent",
            "reason": "restructure",
            "actions": [
                {"entityType": "task", "action": "create",
                 "after": {"title": "Walls", "wbs": "1.2"}},
                {"entityType": "task", "action": "update", "entityId": task_id,
                 "after": {"status": "IN_PROGRESS", "completion": 30}},
                {"entityType": "task", "action": "delete", "entityId": task_id}
            ]
        }),
    )
    .await;
    assert_eq!(outcome.entries.len(), 3);

    // Roll back each emitted entry in reverse order.
    for entry in outcome.entries.iter().rev() {
        state
            .changes
            .rollback_audit(entry.id.as_str(), Actor::User)
            .await
            .unwrap();
    }

    let projects_after = state.store.list_projects().await.unwrap();
    let tasks_after = state.store.list_tasks(&Default::default()).await.unwrap().data;
    assert_eq!(projects_after, projects_before);
    assert_eq!(tasks_after, tasks_before);

    // The draft itself stays applied; rollback never rewrites history.
    let audit = state.store.list_audit(&Default::default()).await.unwrap();
    assert_eq!(
        audit
            .data
            .iter()
            .filter(|entry| entry.action == AuditAction::Rollback)
            .count(),
        3
    );
    let draft = state
        .store
        .get_draft(outcome.draft.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(draft.status, DraftStatus::Applied);
}
