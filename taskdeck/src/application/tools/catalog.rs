// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Tool Catalog
//!
//! The standard tool set exposed to the agent. Read tools query the store
//! and return data; write tools only ever return proposed draft actions
//! (`proposedActions`), which the agent loop funnels through the draft
//! engine; action tools apply or discard an existing draft.
//!
//! Argument fields are deliberately loose - every value may arrive
//! string-typed and is coerced during draft sanitization, so a noisy agent
//! stays unblocked.

use serde_json::{json, Map, Value};

use taskdeck_domain::entities::Actor;
use taskdeck_domain::CoreError;

use crate::application::tools::registry::{ToolCategory, ToolContext, ToolRegistry, ToolSpec};
use crate::infrastructure::persistence::TaskFilter;

/// Builds the registry with the full built-in catalog.
pub fn build_registry() -> Result<ToolRegistry, CoreError> {
    let mut registry = ToolRegistry::new();

    // ---- read tools -----------------------------------------------------

    registry.register(ToolSpec::new(
        "listProjects",
        "List all projects with their ids, names, and descriptions.",
        json!({"type": "object", "properties": {}}),
        ToolCategory::Read,
        |ctx, _args| async move {
            let projects = ctx.store.list_projects().await?;
            Ok(json!({"success": true, "data": projects}))
        },
    ))?;

    registry.register(ToolSpec::new(
        "getProject",
        "Fetch one project by id.",
        json!({
            "type": "object",
            "properties": {"id": {"type": "string", "description": "Project id"}},
            "required": ["id"]
        }),
        ToolCategory::Read,
        |ctx, args| async move {
            let id = required_str(&args, "id")?;
            let project = ctx
                .store
                .get_project(&id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("project {} not found", id)))?;
            Ok(json!({"success": true, "data": project}))
        },
    ))?;

    registry.register(ToolSpec::new(
        "listTasks",
        "List tasks, optionally filtered by project, status, or assignee. Paginated.",
        json!({
            "type": "object",
            "properties": {
                "projectId": {"type": "string"},
                "status": {"type": "string", "enum": ["TODO", "IN_PROGRESS", "DONE"]},
                "assignee": {"type": "string"},
                "page": {"type": "integer"},
                "pageSize": {"type": "integer"}
            }
        }),
        ToolCategory::Read,
        |ctx, args| async move {
            let page = ctx.store.list_tasks(&task_filter(&args, None)?).await?;
            Ok(json!({"success": true, "data": page}))
        },
    ))?;

    registry.register(ToolSpec::new(
        "searchTasks",
        "Search tasks by a case-insensitive substring over title and description.",
        json!({
            "type": "object",
            "properties": {
                "q": {"type": "string", "description": "Search text"},
                "projectId": {"type": "string"},
                "page": {"type": "integer"},
                "pageSize": {"type": "integer"}
            },
            "required": ["q"]
        }),
        ToolCategory::Read,
        |ctx, args| async move {
            let q = required_str(&args, "q")?;
            let page = ctx
                .store
                .list_tasks(&task_filter(&args, Some(q))?)
                .await?;
            Ok(json!({"success": true, "data": page}))
        },
    ))?;

    registry.register(ToolSpec::new(
        "getTask",
        "Fetch one task by id.",
        json!({
            "type": "object",
            "properties": {"id": {"type": "string", "description": "Task id"}},
            "required": ["id"]
        }),
        ToolCategory::Read,
        |ctx, args| async move {
            let id = required_str(&args, "id")?;
            let task = ctx
                .store
                .get_task(&id)
                .await?
                .ok_or_else(|| CoreError::not_found(format!("task {} not found", id)))?;
            Ok(json!({"success": true, "data": task}))
        },
    ))?;

    // ---- write tools (proposals only) -----------------------------------

    registry.register(ToolSpec::new(
        "createProject",
        "Propose creating a project. Returns draft actions; nothing is written until the draft is applied.",
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "description": {"type": "string"},
                "icon": {"type": "string"},
                "reason": {"type": "string", "description": "Why this change is proposed"}
            },
            "required": ["name"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let after = fields_except(&args, &["reason"]);
            Ok(proposal(
                json!([{"entityType": "project", "action": "create", "after": after}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "updateProject",
        "Propose updating a project's fields. Only provided fields change.",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "description": {"type": "string"},
                "icon": {"type": "string"},
                "reason": {"type": "string"}
            },
            "required": ["id"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let id = required_str(&args, "id")?;
            let after = fields_except(&args, &["id", "reason"]);
            Ok(proposal(
                json!([{"entityType": "project", "action": "update", "entityId": id, "after": after}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "deleteProject",
        "Propose deleting a project. Applying the draft also deletes its tasks.",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "reason": {"type": "string"}
            },
            "required": ["id"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let id = required_str(&args, "id")?;
            Ok(proposal(
                json!([{"entityType": "project", "action": "delete", "entityId": id}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "createTask",
        "Propose creating a task in a project.",
        json!({
            "type": "object",
            "properties": {
                "projectId": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "status": {"type": "string", "enum": ["TODO", "IN_PROGRESS", "DONE"]},
                "priority": {"type": "string", "enum": ["LOW", "MEDIUM", "HIGH"]},
                "startDate": {"type": "integer", "description": "Milliseconds since epoch"},
                "dueDate": {"type": "integer", "description": "Milliseconds since epoch"},
                "completion": {"type": "integer", "minimum": 0, "maximum": 100},
                "assignee": {"type": "string"},
                "wbs": {"type": "string", "description": "Dotted-numeric WBS code like 1.2.3"},
                "isMilestone": {"type": "boolean"},
                "predecessors": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Task ids or WBS codes this task depends on"
                },
                "reason": {"type": "string"}
            },
            "required": ["title"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let after = fields_except(&args, &["reason"]);
            Ok(proposal(
                json!([{"entityType": "task", "action": "create", "after": after}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "updateTask",
        "Propose updating a task's fields. Only provided fields change.",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "status": {"type": "string", "enum": ["TODO", "IN_PROGRESS", "DONE"]},
                "priority": {"type": "string", "enum": ["LOW", "MEDIUM", "HIGH"]},
                "startDate": {"type": "integer"},
                "dueDate": {"type": "integer"},
                "completion": {"type": "integer"},
                "assignee": {"type": "string"},
                "wbs": {"type": "string"},
                "isMilestone": {"type": "boolean"},
                "predecessors": {"type": "array", "items": {"type": "string"}},
                "reason": {"type": "string"}
            },
            "required": ["id"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let id = required_str(&args, "id")?;
            let after = fields_except(&args, &["id", "reason"]);
            Ok(proposal(
                json!([{"entityType": "task", "action": "update", "entityId": id, "after": after}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "deleteTask",
        "Propose deleting a task.",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "reason": {"type": "string"}
            },
            "required": ["id"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let id = required_str(&args, "id")?;
            Ok(proposal(
                json!([{"entityType": "task", "action": "delete", "entityId": id}]),
                &args,
            ))
        },
    ))?;

    registry.register(ToolSpec::new(
        "planChanges",
        "Propose a batch of changes across projects and tasks in one draft. \
         Each action is {entityType, action, entityId?, after?}.",
        json!({
            "type": "object",
            "properties": {
                "actions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "entityType": {"type": "string", "enum": ["project", "task"]},
                            "action": {"type": "string", "enum": ["create", "update", "delete"]},
                            "entityId": {"type": "string"},
                            "after": {"type": "object"}
                        },
                        "required": ["entityType", "action"]
                    }
                },
                "projectId": {"type": "string"},
                "reason": {"type": "string"}
            },
            "required": ["actions"]
        }),
        ToolCategory::Write,
        |_ctx, args| async move {
            let actions = args
                .get("actions")
                .filter(|actions| actions.is_array())
                .cloned()
                .ok_or_else(|| CoreError::validation("planChanges requires an actions array"))?;
            Ok(proposal(actions, &args))
        },
    ))?;

    // ---- action tools ---------------------------------------------------

    registry.register(ToolSpec::new(
        "applyChanges",
        "Apply a pending draft by id, committing its actions and emitting audit entries.",
        json!({
            "type": "object",
            "properties": {"draftId": {"type": "string"}},
            "required": ["draftId"]
        }),
        ToolCategory::Action,
        |ctx, args| async move {
            let draft_id = required_str(&args, "draftId")?;
            let outcome = ctx.changes.apply_draft(&draft_id, Actor::Agent).await?;
            Ok(json!({
                "success": true,
                "data": {
                    "draft": outcome.draft,
                    "auditEntryIds": outcome
                        .entries
                        .iter()
                        .map(|entry| entry.id.as_str())
                        .collect::<Vec<_>>(),
                }
            }))
        },
    ))?;

    registry.register(ToolSpec::new(
        "discardChanges",
        "Discard a pending draft by id without applying it.",
        json!({
            "type": "object",
            "properties": {"draftId": {"type": "string"}},
            "required": ["draftId"]
        }),
        ToolCategory::Action,
        |ctx, args| async move {
            let draft_id = required_str(&args, "draftId")?;
            let draft = ctx.drafts.discard(&draft_id).await?;
            Ok(json!({"success": true, "data": draft}))
        },
    ))?;

    Ok(registry)
}

/// Shapes a write-tool result: the proposed actions plus draft-level
/// context lifted from the arguments.
fn proposal(actions: Value, args: &Value) -> Value {
    json!({
        "success": true,
        "proposedActions": actions,
        "projectId": args.get("projectId").and_then(Value::as_str),
        "reason": args.get("reason").and_then(Value::as_str),
    })
}

fn required_str(args: &Value, key: &str) -> Result<String, CoreError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::validation(format!("missing required argument '{}'", key)))
}

fn opt_u32(args: &Value, key: &str) -> Option<u32> {
    args.get(key).and_then(Value::as_u64).map(|n| n as u32)
}

fn fields_except(args: &Value, skip: &[&str]) -> Map<String, Value> {
    match args.as_object() {
        Some(object) => object
            .iter()
            .filter(|(key, _)| !skip.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => Map::new(),
    }
}

fn task_filter(args: &Value, q: Option<String>) -> Result<TaskFilter, CoreError> {
    let status = match args.get("status").and_then(Value::as_str) {
        Some(raw) => Some(
            taskdeck_domain::entities::TaskStatus::parse_loose(raw)
                .ok_or_else(|| CoreError::validation(format!("unknown status '{}'", raw)))?,
        ),
        None => None,
    };
    Ok(TaskFilter {
        project_id: args
            .get("projectId")
            .and_then(Value::as_str)
            .map(str::to_string),
        status,
        assignee: args
            .get("assignee")
            .and_then(Value::as_str)
            .map(str::to_string),
        q,
        page: opt_u32(args, "page"),
        page_size: opt_u32(args, "pageSize"),
    })
}
