// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Draft Input Sanitization
//!
//! Draft actions arrive from two noisy sources: humans typing JSON and a
//! language model calling tools with loosely typed arguments. Per contract,
//! every field is treated as optional and possibly string-typed at the wire:
//! this module canonicalizes an action's `after` object into the shapes the
//! apply engine expects, dropping unknown keys silently and collecting a
//! human-readable issue for every value it could not coerce.
//!
//! Canonical shapes after sanitization:
//!
//! - text fields: JSON strings (numbers and bools are stringified)
//! - `status` / `priority`: canonical uppercase spellings
//! - timestamps: integer milliseconds
//! - `completion`: integer (range-checked softly here, clamped at apply)
//! - `isMilestone`: boolean
//! - `predecessors`: array of strings
//! - explicit `null` survives on optional fields - it means "clear"

use serde_json::{Map, Value};

use crate::entities::task::{TaskPriority, TaskStatus};
use crate::value_objects::WbsCode;

/// Result of canonicalizing one `after` object.
#[derive(Debug, Default)]
pub struct Sanitized {
    pub fields: Map<String, Value>,
    pub issues: Vec<String>,
}

const PROJECT_TEXT_KEYS: &[&str] = &["name", "description", "icon"];

/// Canonicalizes the `after` object of a project create/update action.
pub fn project_fields(raw: &Map<String, Value>) -> Sanitized {
    let mut out = Sanitized::default();
    for key in PROJECT_TEXT_KEYS {
        if let Some(value) = raw.get(*key) {
            put_text(&mut out, key, value);
        }
    }
    out
}

/// Canonicalizes the `after` object of a task create/update action.
pub fn task_fields(raw: &Map<String, Value>) -> Sanitized {
    let mut out = Sanitized::default();

    for key in ["projectId", "title", "description", "assignee"] {
        if let Some(value) = raw.get(key) {
            put_text(&mut out, key, value);
        }
    }

    if let Some(value) = raw.get("status") {
        match value.as_str().map(str::trim) {
            Some(s) => match TaskStatus::parse_loose(s) {
                Some(status) => {
                    out.fields
                        .insert("status".into(), Value::String(status.as_str().into()));
                }
                None => out.issues.push(format!("unknown status '{}'", s)),
            },
            None => out.issues.push("status must be a string".into()),
        }
    }

    if let Some(value) = raw.get("priority") {
        match value.as_str().map(str::trim) {
            Some(s) => match TaskPriority::parse_loose(s) {
                Some(priority) => {
                    out.fields
                        .insert("priority".into(), Value::String(priority.as_str().into()));
                }
                None => out.issues.push(format!("unknown priority '{}'", s)),
            },
            None => out.issues.push("priority must be a string".into()),
        }
    }

    for key in ["startDate", "dueDate"] {
        if let Some(value) = raw.get(key) {
            if value.is_null() {
                out.fields.insert(key.into(), Value::Null);
            } else {
                match coerce_millis(value) {
                    Some(ms) => {
                        out.fields.insert(key.into(), Value::from(ms));
                    }
                    None => out.issues.push(format!("{} is not a timestamp", key)),
                }
            }
        }
    }

    if let Some(value) = raw.get("completion") {
        match coerce_integer(value) {
            Some(n) => {
                if !(0..=100).contains(&n) {
                    out.issues.push(format!("completion {} outside [0,100]", n));
                }
                out.fields.insert("completion".into(), Value::from(n));
            }
            None => out.issues.push("completion is not a number".into()),
        }
    }

    if let Some(value) = raw.get("wbs") {
        if value.is_null() {
            out.fields.insert("wbs".into(), Value::Null);
        } else {
            match value.as_str() {
                Some(s) if WbsCode::is_valid(s) => {
                    out.fields
                        .insert("wbs".into(), Value::String(s.trim().into()));
                }
                Some(s) => out
                    .issues
                    .push(format!("wbs '{}' is not dotted-numeric", s)),
                None => out.issues.push("wbs must be a string".into()),
            }
        }
    }

    if let Some(value) = raw.get("isMilestone") {
        match coerce_bool(value) {
            Some(flag) => {
                out.fields.insert("isMilestone".into(), Value::Bool(flag));
            }
            None => out.issues.push("isMilestone is not a boolean".into()),
        }
    }

    if let Some(value) = raw.get("predecessors") {
        if value.is_null() {
            out.fields.insert("predecessors".into(), Value::Null);
        } else {
            match coerce_string_list(value) {
                Some(refs) => {
                    out.fields.insert(
                        "predecessors".into(),
                        Value::Array(refs.into_iter().map(Value::String).collect()),
                    );
                }
                None => out
                    .issues
                    .push("predecessors must be a list of ids or WBS codes".into()),
            }
        }
    }

    out
}

fn put_text(out: &mut Sanitized, key: &str, value: &Value) {
    match value {
        Value::Null => {
            out.fields.insert(key.into(), Value::Null);
        }
        Value::String(s) => {
            out.fields.insert(key.into(), Value::String(s.clone()));
        }
        Value::Number(n) => {
            out.fields.insert(key.into(), Value::String(n.to_string()));
        }
        Value::Bool(b) => {
            out.fields.insert(key.into(), Value::String(b.to_string()));
        }
        _ => out.issues.push(format!("{} must be a string", key)),
    }
}

fn coerce_millis(value: &Value) -> Option<i64> {
    coerce_integer(value).filter(|ms| chrono::DateTime::from_timestamp_millis(*ms).is_some())
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().or_else(|| {
            s.trim()
                .parse::<f64>()
                .ok()
                .map(|f| f.round() as i64)
        }),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let mut refs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) if !s.trim().is_empty() => refs.push(s.trim().to_string()),
                    Value::Number(n) => refs.push(n.to_string()),
                    _ => return None,
                }
            }
            Some(refs)
        }
        // The agent occasionally sends "1.1, 1.2" instead of an array.
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}
