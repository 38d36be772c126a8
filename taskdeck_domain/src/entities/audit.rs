// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Audit Entries
//!
//! The audit log is append-only: one entry per entity mutation, carrying
//! full before/after snapshots rather than diffs. Snapshots make the entry
//! self-sufficient - display, field-level diffing, and inverse synthesis all
//! work from the entry alone, decoupled from schema evolution and from rows
//! that may no longer exist.
//!
//! A `rollback` entry records the application of an inverse and points at
//! the entry it reversed via `rollbackOfAuditId`. Rollback entries are
//! themselves terminal: rolling back a rollback is disallowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::draft::{Actor, EntityKind};
use crate::error::CoreError;
use crate::services::millis_serde;
use crate::value_objects::RecordId;

/// The recorded effect of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Rollback,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Rollback => "rollback",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            "rollback" => Ok(AuditAction::Rollback),
            other => Err(CoreError::serialization(format!(
                "unknown audit action '{}'",
                other
            ))),
        }
    }
}

/// One append-only record of an entity mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: RecordId,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor: Actor,
    /// Full prior row, or null for a create.
    #[serde(default)]
    pub before: Option<Value>,
    /// Full new row, or null for a delete.
    #[serde(default)]
    pub after: Option<Value>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(with = "millis_serde")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source_draft_id: Option<RecordId>,
    #[serde(default)]
    pub rollback_of_audit_id: Option<RecordId>,
}

impl AuditEntry {
    /// Checks the snapshot-shape invariant for the entry's action:
    /// creates have no `before`, deletes have no `after`, updates and
    /// rollbacks carry whichever sides the change had.
    pub fn validate_snapshots(&self) -> Result<(), CoreError> {
        match self.action {
            AuditAction::Create => {
                if self.before.is_some() || self.after.is_none() {
                    return Err(CoreError::validation(
                        "create audit entry must have after and no before",
                    ));
                }
            }
            AuditAction::Delete => {
                if self.before.is_none() || self.after.is_some() {
                    return Err(CoreError::validation(
                        "delete audit entry must have before and no after",
                    ));
                }
            }
            AuditAction::Update => {
                if self.before.is_none() || self.after.is_none() {
                    return Err(CoreError::validation(
                        "update audit entry must have both snapshots",
                    ));
                }
            }
            AuditAction::Rollback => {}
        }
        Ok(())
    }

    pub fn is_rollback(&self) -> bool {
        self.action == AuditAction::Rollback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(action: AuditAction, before: Option<Value>, after: Option<Value>) -> AuditEntry {
        AuditEntry {
            id: RecordId::generate(),
            project_id: None,
            entity_type: EntityKind::Task,
            entity_id: "t1".into(),
            action,
            actor: Actor::User,
            before,
            after,
            reason: None,
            timestamp: Utc::now(),
            source_draft_id: None,
            rollback_of_audit_id: None,
        }
    }

    #[test]
    fn create_entries_have_after_only() {
        assert!(entry(AuditAction::Create, None, Some(json!({"id": "t1"})))
            .validate_snapshots()
            .is_ok());
        assert!(entry(AuditAction::Create, Some(json!({})), Some(json!({})))
            .validate_snapshots()
            .is_err());
        assert!(entry(AuditAction::Create, None, None)
            .validate_snapshots()
            .is_err());
    }

    #[test]
    fn delete_entries_have_before_only() {
        assert!(entry(AuditAction::Delete, Some(json!({"id": "t1"})), None)
            .validate_snapshots()
            .is_ok());
        assert!(entry(AuditAction::Delete, None, None)
            .validate_snapshots()
            .is_err());
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let value = serde_json::to_value(entry(
            AuditAction::Rollback,
            Some(json!({"status": "DONE"})),
            Some(json!({"status": "TODO"})),
        ))
        .unwrap();
        assert_eq!(value["action"], json!("rollback"));
        assert_eq!(value["entityType"], json!("task"));
        assert_eq!(value["rollbackOfAuditId"], Value::Null);
        assert_eq!(value["sourceDraftId"], Value::Null);
    }
}
