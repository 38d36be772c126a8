// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Row Serializer
//!
//! Bidirectional mapping between stored row shapes and the wire-shaped
//! domain records. The storage conventions are:
//!
//! - timestamps as INTEGER milliseconds since epoch
//! - enums as their canonical wire spellings (`TODO`, `pending`, `create`)
//! - array/object columns (`tasks.predecessors`, `drafts.actions`,
//!   `drafts.warnings`, `audit_logs.before_state`/`after_state`) as JSON
//!   text, deserialized lazily on read
//!
//! On read, `predecessors` is always an array, never null. A row that fails
//! to decode is a storage corruption, surfaced as a serialization error
//! rather than a panic.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use taskdeck_domain::entities::draft::DraftAction;
use taskdeck_domain::entities::{
    Actor, AuditAction, AuditEntry, Draft, DraftStatus, EntityKind, Project, Task, TaskPriority,
    TaskStatus,
};
use taskdeck_domain::{CoreError, RecordId};

fn db_err(e: sqlx::Error) -> CoreError {
    CoreError::database_error(format!("row decode failed: {}", e))
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| CoreError::serialization(format!("stored timestamp {} out of range", ms)))
}

fn opt_millis_to_datetime(ms: Option<i64>) -> Result<Option<DateTime<Utc>>, CoreError> {
    ms.map(millis_to_datetime).transpose()
}

fn record_id(raw: String) -> Result<RecordId, CoreError> {
    RecordId::parse(raw).map_err(|e| CoreError::serialization(format!("stored id invalid: {}", e)))
}

/// Serializes a value for a JSON-text column.
pub fn to_json_text<T: serde::Serialize>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string(value)
        .map_err(|e| CoreError::serialization(format!("json encode failed: {}", e)))
}

fn from_json_text<T: serde::de::DeserializeOwned>(text: &str, what: &str) -> Result<T, CoreError> {
    serde_json::from_str(text)
        .map_err(|e| CoreError::serialization(format!("stored {} invalid: {}", what, e)))
}

pub fn project_from_row(row: &SqliteRow) -> Result<Project, CoreError> {
    Ok(Project {
        id: record_id(row.try_get("id").map_err(db_err)?)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        icon: row.try_get("icon").map_err(db_err)?,
        created_at: millis_to_datetime(row.try_get("created_at").map_err(db_err)?)?,
    })
}

pub fn task_from_row(row: &SqliteRow) -> Result<Task, CoreError> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let priority: String = row.try_get("priority").map_err(db_err)?;
    let predecessors: Option<String> = row.try_get("predecessors").map_err(db_err)?;

    Ok(Task {
        id: record_id(row.try_get("id").map_err(db_err)?)?,
        project_id: record_id(row.try_get("project_id").map_err(db_err)?)?,
        title: row.try_get("title").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        status: TaskStatus::parse(&status)?,
        priority: TaskPriority::parse(&priority)?,
        created_at: millis_to_datetime(row.try_get("created_at").map_err(db_err)?)?,
        start_date: opt_millis_to_datetime(row.try_get("start_date").map_err(db_err)?)?,
        due_date: opt_millis_to_datetime(row.try_get("due_date").map_err(db_err)?)?,
        completion: row.try_get("completion").map_err(db_err)?,
        assignee: row.try_get("assignee").map_err(db_err)?,
        wbs: row.try_get("wbs").map_err(db_err)?,
        is_milestone: row.try_get("is_milestone").map_err(db_err)?,
        predecessors: match predecessors.as_deref() {
            None | Some("") => Vec::new(),
            Some(text) => from_json_text(text, "predecessors")?,
        },
    })
}

pub fn draft_from_row(row: &SqliteRow) -> Result<Draft, CoreError> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let created_by: String = row.try_get("created_by").map_err(db_err)?;
    let actions: String = row.try_get("actions").map_err(db_err)?;
    let warnings: String = row.try_get("warnings").map_err(db_err)?;
    let project_id: Option<String> = row.try_get("project_id").map_err(db_err)?;

    Ok(Draft {
        id: record_id(row.try_get("id").map_err(db_err)?)?,
        project_id: project_id.map(record_id).transpose()?,
        created_by: Actor::parse(&created_by)?,
        status: DraftStatus::parse(&status)?,
        reason: row.try_get("reason").map_err(db_err)?,
        actions: from_json_text::<Vec<DraftAction>>(&actions, "draft actions")?,
        warnings: from_json_text(&warnings, "draft warnings")?,
        created_at: millis_to_datetime(row.try_get("created_at").map_err(db_err)?)?,
        applied_at: opt_millis_to_datetime(row.try_get("applied_at").map_err(db_err)?)?,
    })
}

pub fn audit_from_row(row: &SqliteRow) -> Result<AuditEntry, CoreError> {
    let entity_type: String = row.try_get("entity_type").map_err(db_err)?;
    let action: String = row.try_get("action").map_err(db_err)?;
    let actor: String = row.try_get("actor").map_err(db_err)?;
    let before: Option<String> = row.try_get("before_state").map_err(db_err)?;
    let after: Option<String> = row.try_get("after_state").map_err(db_err)?;
    let project_id: Option<String> = row.try_get("project_id").map_err(db_err)?;
    let source_draft_id: Option<String> = row.try_get("source_draft_id").map_err(db_err)?;
    let rollback_of: Option<String> = row.try_get("rollback_of_audit_id").map_err(db_err)?;

    Ok(AuditEntry {
        id: record_id(row.try_get("id").map_err(db_err)?)?,
        project_id: project_id.map(record_id).transpose()?,
        entity_type: EntityKind::parse(&entity_type)?,
        entity_id: row.try_get("entity_id").map_err(db_err)?,
        action: AuditAction::parse(&action)?,
        actor: Actor::parse(&actor)?,
        before: before
            .as_deref()
            .map(|text| from_json_text::<Value>(text, "before snapshot"))
            .transpose()?,
        after: after
            .as_deref()
            .map(|text| from_json_text::<Value>(text, "after snapshot"))
            .transpose()?,
        reason: row.try_get("reason").map_err(db_err)?,
        timestamp: millis_to_datetime(row.try_get("timestamp").map_err(db_err)?)?,
        source_draft_id: source_draft_id.map(record_id).transpose()?,
        rollback_of_audit_id: rollback_of.map(record_id).transpose()?,
    })
}
