// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end HTTP scenarios: the envelope, the direct-mutation draft
//! synthesis, the draft/apply/rollback lifecycle, and error mapping.

#[allow(dead_code)]
mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{request, test_app};

#[tokio::test]
async fn create_project_returns_record_and_audits_with_source_draft() {
    let (_state, app) = test_app().await;

    let (status, body) = request(&app, "POST", "/api/projects", Some(json!({"name": "Alpha"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("Alpha"));
    let project_id = body["data"]["id"].as_str().unwrap().to_string();

    // One audit entry: create, before null, carrying a sourceDraftId even
    // though the call was a direct mutation.
    let (_, audit) = request(&app, "GET", "/api/audit", None).await;
    let entries = audit["data"]["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], json!("create"));
    assert_eq!(entries[0]["entityType"], json!("project"));
    assert_eq!(entries[0]["entityId"], json!(project_id.clone()));
    assert_eq!(entries[0]["before"], Value::Null);
    assert_eq!(entries[0]["after"]["name"], json!("Alpha"));
    assert!(entries[0]["sourceDraftId"].is_string());

    // The implicit draft is retained as applied.
    let draft_id = entries[0]["sourceDraftId"].as_str().unwrap();
    let (_, draft) = request(&app, "GET", &format!("/api/drafts/{}", draft_id), None).await;
    assert_eq!(draft["data"]["status"], json!("applied"));
    assert_eq!(draft["data"]["createdBy"], json!("user"));
}

#[tokio::test]
async fn draft_submit_apply_patch_rollback_scenario() {
    let (_state, app) = test_app().await;

    let (_, created) =
        request(&app, "POST", "/api/projects", Some(json!({"name": "Alpha"}))).await;
    let project_id = created["data"]["id"].as_str().unwrap().to_string();

    // Agent submits a create with inverted dates: accepted with a warning.
    let (status, submitted) = request(
        &app,
        "POST",
        "/api/drafts",
        Some(json!({
            "createdBy": "agent",
            "actions": [{
                "entityType": "task",
                "action": "create",
                "after": {
                    "projectId": project_id,
                    "title": "Foundations",
                    "startDate": 1_735_689_600_000i64,
                    "dueDate": 1_735_689_000_000i64
                }
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["data"]["draft"]["status"], json!("pending"));
    assert_eq!(
        submitted["data"]["warnings"],
        json!(["Foundations: due before start"])
    );
    let draft_id = submitted["data"]["draft"]["id"].as_str().unwrap().to_string();

    // Apply: the task now exists, one create audit entry.
    let (status, applied) = request(
        &app,
        "POST",
        &format!("/api/drafts/{}/apply", draft_id),
        Some(json!({"actor": "user"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied["data"]["draft"]["status"], json!("applied"));
    let (_, tasks) = request(
        &app,
        "GET",
        &format!("/api/tasks?projectId={}", project_id),
        None,
    )
    .await;
    assert_eq!(tasks["data"]["total"], json!(1));
    let task_id = tasks["data"]["data"][0]["id"].as_str().unwrap().to_string();

    // Direct PATCH: now two entries exist for the task.
    let (status, patched) = request(
        &app,
        "PATCH",
        &format!("/api/tasks/{}", task_id),
        Some(json!({"status": "DONE", "completion": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["status"], json!("DONE"));

    let (_, audit) = request(
        &app,
        "GET",
        &format!("/api/audit?taskId={}", task_id),
        None,
    )
    .await;
    let entries = audit["data"]["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // timestamp DESC: the update comes first.
    assert_eq!(entries[0]["action"], json!("update"));
    assert_eq!(entries[1]["action"], json!("create"));
    let update_entry_id = entries[0]["id"].as_str().unwrap().to_string();

    // Rollback the update: status and completion revert.
    let (status, rollback) = request(
        &app,
        "POST",
        &format!("/api/audit/{}/rollback", update_entry_id),
        Some(json!({"actor": "user"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rollback["data"]["action"], json!("rollback"));
    assert_eq!(
        rollback["data"]["rollbackOfAuditId"],
        json!(update_entry_id)
    );

    let (_, task) = request(&app, "GET", &format!("/api/tasks/{}", task_id), None).await;
    assert_eq!(task["data"]["status"], json!("TODO"));
    assert_eq!(task["data"]["completion"], json!(0));

    // Delete the project: the task goes with it, two new delete entries.
    let (status, deleted) =
        request(&app, "DELETE", &format!("/api/projects/{}", project_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["auditEntries"], json!(2));
    let (status, _) = request(&app, "GET", &format!("/api/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn error_envelope_maps_kinds_to_status_codes() {
    let (_state, app) = test_app().await;

    // NOT_FOUND
    let (status, body) = request(&app, "GET", "/api/projects/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));

    // VALIDATION: empty actions array.
    let (status, body) = request(
        &app,
        "POST",
        "/api/drafts",
        Some(json!({"createdBy": "user", "actions": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION"));

    // VALIDATION: unknown discriminator is structural.
    let (status, body) = request(
        &app,
        "POST",
        "/api/drafts",
        Some(json!({
            "createdBy": "user",
            "actions": [{"entityType": "widget", "action": "create", "after": {}}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("VALIDATION"));

    // CONFLICT: applying a discarded draft.
    let (_, submitted) = request(
        &app,
        "POST",
        "/api/drafts",
        Some(json!({
            "createdBy": "user",
            "actions": [{"entityType": "project", "action": "create", "after": {"name": "B"}}]
        })),
    )
    .await;
    let draft_id = submitted["data"]["draft"]["id"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/drafts/{}/discard", draft_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/drafts/{}/apply", draft_id),
        Some(json!({"actor": "user"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("CONFLICT"));
}

#[tokio::test]
async fn task_listing_filters_and_searches() {
    let (_state, app) = test_app().await;
    let (_, created) =
        request(&app, "POST", "/api/projects", Some(json!({"name": "Alpha"}))).await;
    let project_id = created["data"]["id"].as_str().unwrap().to_string();

    for (title, status, assignee) in [
        ("Pour foundation", "DONE", "kim"),
        ("Frame walls", "IN_PROGRESS", "kim"),
        ("Paint", "TODO", "ada"),
    ] {
        let (code, _) = request(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({
                "projectId": project_id,
                "title": title,
                "status": status,
                "assignee": assignee
            })),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
    }

    let (_, by_status) = request(&app, "GET", "/api/tasks?status=IN_PROGRESS", None).await;
    assert_eq!(by_status["data"]["total"], json!(1));
    assert_eq!(
        by_status["data"]["data"][0]["title"],
        json!("Frame walls")
    );

    let (_, by_assignee) = request(&app, "GET", "/api/tasks?assignee=kim", None).await;
    assert_eq!(by_assignee["data"]["total"], json!(2));

    let (_, by_q) = request(&app, "GET", "/api/tasks?q=FOUND", None).await;
    assert_eq!(by_q["data"]["total"], json!(1));

    let (_, paged) = request(&app, "GET", "/api/tasks?page=2&pageSize=2", None).await;
    assert_eq!(paged["data"]["total"], json!(3));
    assert_eq!(paged["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(paged["data"]["page"], json!(2));

    let (status, _) = request(&app, "GET", "/api/tasks?status=BOGUS", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn audit_detail_includes_field_diff() {
    let (_state, app) = test_app().await;
    let (_, created) =
        request(&app, "POST", "/api/projects", Some(json!({"name": "Alpha"}))).await;
    let project_id = created["data"]["id"].as_str().unwrap().to_string();
    let (status, patched) = request(
        &app,
        "PATCH",
        &format!("/api/projects/{}", project_id),
        Some(json!({"name": "Alpha 2", "description": "renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["name"], json!("Alpha 2"));

    let (_, audit) = request(&app, "GET", "/api/audit?action=update", None).await;
    let entry_id = audit["data"]["data"][0]["id"].as_str().unwrap().to_string();
    let (_, detail) = request(&app, "GET", &format!("/api/audit/{}", entry_id), None).await;

    let diff = detail["data"]["diff"].as_array().unwrap();
    assert_eq!(diff.len(), 2);
    assert_eq!(diff[0]["path"], json!("description"));
    assert_eq!(diff[0]["before"], Value::Null);
    assert_eq!(diff[1]["path"], json!("name"));
    assert_eq!(diff[1]["after"], json!("Alpha 2"));
}

#[tokio::test]
async fn ai_endpoint_reports_missing_upstream_as_internal() {
    let (_state, app) = test_app().await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/ai",
        Some(json!({"history": [], "message": "plan my week"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("INTERNAL"));
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let (_state, app) = test_app().await;
    let (status, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));

    let (_, _) = request(&app, "POST", "/api/projects", Some(json!({"name": "A"}))).await;
    let (status, body) = request(&app, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("taskdeck_drafts_applied_total 1"));
    assert!(text.contains("taskdeck_http_requests_total"));
}
