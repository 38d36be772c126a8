// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Project Entity
//!
//! A project is the ownership root of the data model: it exclusively owns
//! its tasks, and deleting it cascades to them (one audit entry per deleted
//! task plus one for the project itself). Projects are created by users or
//! by agent-approved drafts and are mutated only through draft application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::services::millis_serde;
use crate::value_objects::RecordId;

/// Persisted project record in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(with = "millis_serde")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with a generated id, rejecting empty names.
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::validation("project name cannot be empty"));
        }
        Ok(Self {
            id: RecordId::generate(),
            name,
            description: None,
            icon: None,
            created_at,
        })
    }

    /// Checks record-level invariants before a write.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("project name cannot be empty"));
        }
        Ok(())
    }

    /// Merges sanitized patch fields over this record, only provided keys.
    ///
    /// An explicit `null` clears an optional field; `id` and `createdAt`
    /// are not patchable and survive untouched.
    pub fn merged_with(&self, fields: &Map<String, Value>) -> Result<Project, CoreError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| CoreError::serialization(format!("project snapshot failed: {}", e)))?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CoreError::internal_error("project snapshot is not an object"))?;
        for (key, patch) in fields {
            if key == "id" || key == "createdAt" {
                continue;
            }
            obj.insert(key.clone(), patch.clone());
        }
        let merged: Project = serde_json::from_value(value)
            .map_err(|e| CoreError::validation(format!("invalid project fields: {}", e)))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Full snapshot in the shape stored on audit entries.
    pub fn snapshot(&self) -> Result<Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::serialization(format!("project snapshot failed: {}", e)))
    }
}
