// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Task Entity
//!
//! Tasks are parent-owned by their project and mutated only through draft
//! application. The softer scheduling fields (`startDate`, `dueDate`,
//! `completion`, `wbs`, `predecessors`) are validated softly: a draft that
//! violates them is accepted with warnings, and only DB-breaking shapes are
//! rejected at apply time.
//!
//! `predecessors` may hold task ids or WBS strings and is persisted
//! verbatim; readers resolve references. On read it is always an array,
//! never null.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::services::millis_serde;
use crate::value_objects::RecordId;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Strict parse of the canonical spelling, for decoding stored rows.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(CoreError::serialization(format!(
                "unknown task status '{}'",
                other
            ))),
        }
    }

    /// Forgiving parse for wire input: case-insensitive, spaces and hyphens
    /// count as underscores. Returns `None` for genuinely unknown values.
    pub fn parse_loose(s: &str) -> Option<Self> {
        let canon = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::parse(&canon).ok()
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            other => Err(CoreError::serialization(format!(
                "unknown task priority '{}'",
                other
            ))),
        }
    }

    pub fn parse_loose(s: &str) -> Option<Self> {
        Self::parse(s.trim().to_ascii_uppercase().as_str()).ok()
    }
}

fn predecessors_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // null and missing both read as the empty list.
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Persisted task record in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub project_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(with = "millis_serde")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "millis_serde::optional")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "millis_serde::optional")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion: i64,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub wbs: Option<String>,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default, deserialize_with = "predecessors_or_empty")]
    pub predecessors: Vec<String>,
}

impl Task {
    /// Checks the DB-breaking invariants before a write.
    ///
    /// Soft rules (date ordering, completion range) are warning material,
    /// not rejections; completion is expected to have been clamped already.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("task title cannot be empty"));
        }
        Ok(())
    }

    /// True when both dates are set and the due date precedes the start.
    pub fn dates_inverted(&self) -> bool {
        matches!((self.start_date, self.due_date), (Some(start), Some(due)) if due < start)
    }

    /// Clamps completion into `[0, 100]`, the apply-time resolution of the
    /// soft range invariant.
    pub fn clamp_completion(&mut self) {
        self.completion = self.completion.clamp(0, 100);
    }

    /// Merges sanitized patch fields over this record, only provided keys.
    /// Identity and ownership (`id`, `projectId`, `createdAt`) are fixed.
    pub fn merged_with(&self, fields: &Map<String, Value>) -> Result<Task, CoreError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| CoreError::serialization(format!("task snapshot failed: {}", e)))?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CoreError::internal_error("task snapshot is not an object"))?;
        for (key, patch) in fields {
            if key == "id" || key == "projectId" || key == "createdAt" {
                continue;
            }
            obj.insert(key.clone(), patch.clone());
        }
        let merged: Task = serde_json::from_value(value)
            .map_err(|e| CoreError::validation(format!("invalid task fields: {}", e)))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Full snapshot in the shape stored on audit entries.
    pub fn snapshot(&self) -> Result<Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::serialization(format!("task snapshot failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> Task {
        Task {
            id: RecordId::parse("t1").unwrap(),
            project_id: RecordId::parse("p1").unwrap(),
            title: "Foundations".into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            created_at: DateTime::from_timestamp_millis(5_000).unwrap(),
            start_date: None,
            due_date: None,
            completion: 0,
            assignee: None,
            wbs: Some("1.1".into()),
            is_milestone: false,
            predecessors: vec![],
        }
    }

    #[test]
    fn status_parsing_is_loose_on_input_strict_on_rows() {
        assert_eq!(TaskStatus::parse_loose("done"), Some(TaskStatus::Done));
        assert_eq!(
            TaskStatus::parse_loose("in progress"),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(TaskStatus::parse_loose("blocked"), None);
        assert!(TaskStatus::parse("done").is_err());
    }

    #[test]
    fn predecessors_null_reads_as_empty_array() {
        let json = json!({
            "id": "t1",
            "projectId": "p1",
            "title": "x",
            "createdAt": 0,
            "predecessors": null
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert!(task.predecessors.is_empty());
        // And serializes back as an array, never null.
        assert_eq!(task.snapshot().unwrap()["predecessors"], json!([]));
    }

    #[test]
    fn dates_inverted_needs_both_dates() {
        let mut t = task();
        assert!(!t.dates_inverted());
        t.start_date = DateTime::from_timestamp_millis(2_000);
        t.due_date = DateTime::from_timestamp_millis(1_000);
        assert!(t.dates_inverted());
        t.due_date = None;
        assert!(!t.dates_inverted());
    }

    #[test]
    fn merge_keeps_identity_and_clamps_later() {
        let mut fields = Map::new();
        fields.insert("status".into(), json!("DONE"));
        fields.insert("completion".into(), json!(250));
        fields.insert("projectId".into(), json!("p9"));
        let mut merged = task().merged_with(&fields).unwrap();
        assert_eq!(merged.status, TaskStatus::Done);
        assert_eq!(merged.project_id.as_str(), "p1");
        assert_eq!(merged.completion, 250);
        merged.clamp_completion();
        assert_eq!(merged.completion, 100);
    }

    #[test]
    fn merge_rejects_empty_title() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("   "));
        assert!(task().merged_with(&fields).is_err());
    }
}
