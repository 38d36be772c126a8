// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Draft Entity
//!
//! A draft is a persisted batch of proposed mutations with a one-shot state
//! machine: it is created `pending` and transitions exactly once, to
//! `applied` or `discarded`. Applied drafts are retained for traceability
//! and immutable thereafter.
//!
//! Drafts are the choke point that makes agent-driven writes safe: an
//! agent's proposals always materialize as an inspectable pending draft,
//! never as committed state. Validation is soft by design; the entity only
//! enforces structure (non-empty batch, well-formed discriminators) and the
//! state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::services::millis_serde;
use crate::value_objects::RecordId;

/// Who initiated a change: a human, the reasoning agent, or the system
/// itself (seeding, maintenance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Agent,
    System,
}

impl Actor {
    pub fn as_str(self) -> &'static str {
        match self {
            Actor::User => "user",
            Actor::Agent => "agent",
            Actor::System => "system",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "user" => Ok(Actor::User),
            "agent" => Ok(Actor::Agent),
            "system" => Ok(Actor::System),
            other => Err(CoreError::serialization(format!("unknown actor '{}'", other))),
        }
    }
}

/// Which table an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Task,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Task => "task",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "project" => Ok(EntityKind::Project),
            "task" => Ok(EntityKind::Task),
            other => Err(CoreError::serialization(format!(
                "unknown entity type '{}'",
                other
            ))),
        }
    }
}

/// What an action does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
        }
    }
}

/// Lifecycle state of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Pending,
    Applied,
    Discarded,
}

impl DraftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftStatus::Pending => "pending",
            DraftStatus::Applied => "applied",
            DraftStatus::Discarded => "discarded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(DraftStatus::Pending),
            "applied" => Ok(DraftStatus::Applied),
            "discarded" => Ok(DraftStatus::Discarded),
            other => Err(CoreError::serialization(format!(
                "unknown draft status '{}'",
                other
            ))),
        }
    }
}

/// One proposed mutation inside a draft, evaluated in array order at apply
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftAction {
    pub id: RecordId,
    pub entity_type: EntityKind,
    pub action: ActionKind,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub after: Option<Map<String, Value>>,
}

impl DraftAction {
    /// Structural validation - the hard-error half of draft checking.
    ///
    /// `update`/`delete` require an `entityId`; `create`/`update` require an
    /// `after` object. Everything softer than this is warning material.
    pub fn validate_shape(&self) -> Result<(), CoreError> {
        match self.action {
            ActionKind::Update | ActionKind::Delete => {
                if self.entity_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
                    return Err(CoreError::validation(format!(
                        "{} {} action requires an entityId",
                        self.entity_type.as_str(),
                        self.action.as_str()
                    )));
                }
            }
            ActionKind::Create => {}
        }
        match self.action {
            ActionKind::Create | ActionKind::Update => {
                if self.after.is_none() {
                    return Err(CoreError::validation(format!(
                        "{} {} action requires an 'after' object",
                        self.entity_type.as_str(),
                        self.action.as_str()
                    )));
                }
            }
            ActionKind::Delete => {}
        }
        Ok(())
    }

    /// Display label for warnings: the target id when known, otherwise the
    /// proposed title/name, otherwise the action id.
    pub fn label(&self) -> String {
        if let Some(id) = self.entity_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return id.to_string();
        }
        if let Some(after) = &self.after {
            for key in ["title", "name"] {
                if let Some(text) = after.get(key).and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        return text.to_string();
                    }
                }
            }
        }
        self.id.to_string()
    }
}

/// Persisted draft record in wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: RecordId,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    pub created_by: Actor,
    pub status: DraftStatus,
    #[serde(default)]
    pub reason: Option<String>,
    pub actions: Vec<DraftAction>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(with = "millis_serde")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "millis_serde::optional")]
    pub applied_at: Option<DateTime<Utc>>,
}

impl Draft {
    /// Assembles a new pending draft, rejecting an empty action batch.
    pub fn new(
        project_id: Option<RecordId>,
        created_by: Actor,
        reason: Option<String>,
        actions: Vec<DraftAction>,
        warnings: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CoreError> {
        if actions.is_empty() {
            return Err(CoreError::validation("draft requires at least one action"));
        }
        for action in &actions {
            action.validate_shape()?;
        }
        Ok(Self {
            id: RecordId::generate(),
            project_id,
            created_by,
            status: DraftStatus::Pending,
            reason,
            actions,
            warnings,
            created_at,
            applied_at: None,
        })
    }

    /// `pending -> applied`; any other starting state is a conflict.
    pub fn mark_applied(&mut self, at: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            DraftStatus::Pending => {
                self.status = DraftStatus::Applied;
                self.applied_at = Some(at);
                Ok(())
            }
            other => Err(CoreError::conflict(format!(
                "draft {} is {}, not pending",
                self.id,
                other.as_str()
            ))),
        }
    }

    /// `pending -> discarded`. Idempotent on an already-discarded draft
    /// (returns `false`); conflict on an applied one.
    pub fn mark_discarded(&mut self) -> Result<bool, CoreError> {
        match self.status {
            DraftStatus::Pending => {
                self.status = DraftStatus::Discarded;
                Ok(true)
            }
            DraftStatus::Discarded => Ok(false),
            DraftStatus::Applied => Err(CoreError::conflict(format!(
                "draft {} is already applied",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_action(after: Value) -> DraftAction {
        DraftAction {
            id: RecordId::generate(),
            entity_type: EntityKind::Task,
            action: ActionKind::Create,
            entity_id: None,
            after: after.as_object().cloned(),
        }
    }

    fn pending_draft() -> Draft {
        Draft::new(
            None,
            Actor::Agent,
            Some("plan".into()),
            vec![create_action(json!({"title": "x"}))],
            vec![],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_batch_is_a_hard_error() {
        let err = Draft::new(None, Actor::User, None, vec![], vec![], Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn update_without_entity_id_is_structural() {
        let action = DraftAction {
            id: RecordId::generate(),
            entity_type: EntityKind::Task,
            action: ActionKind::Update,
            entity_id: None,
            after: json!({"title": "y"}).as_object().cloned(),
        };
        assert!(action.validate_shape().is_err());
    }

    #[test]
    fn create_without_after_is_structural() {
        let action = DraftAction {
            id: RecordId::generate(),
            entity_type: EntityKind::Project,
            action: ActionKind::Create,
            entity_id: None,
            after: None,
        };
        assert!(action.validate_shape().is_err());
    }

    #[test]
    fn state_machine_is_one_shot() {
        let mut draft = pending_draft();
        draft.mark_applied(Utc::now()).unwrap();
        assert_eq!(draft.status, DraftStatus::Applied);
        assert!(draft.applied_at.is_some());
        assert!(draft.mark_applied(Utc::now()).is_err());
        assert!(draft.mark_discarded().is_err());
    }

    #[test]
    fn discard_is_idempotent_on_discarded() {
        let mut draft = pending_draft();
        assert!(draft.mark_discarded().unwrap());
        assert!(!draft.mark_discarded().unwrap());
        assert!(draft.mark_applied(Utc::now()).is_err());
    }

    #[test]
    fn label_prefers_entity_id_then_title() {
        let mut action = create_action(json!({"title": "Foundations"}));
        assert_eq!(action.label(), "Foundations");
        action.entity_id = Some("t9".into());
        assert_eq!(action.label(), "t9");
    }

    #[test]
    fn wire_shape_uses_lowercase_discriminators() {
        let value = serde_json::to_value(pending_draft()).unwrap();
        assert_eq!(value["createdBy"], json!("agent"));
        assert_eq!(value["status"], json!("pending"));
        assert_eq!(value["actions"][0]["entityType"], json!("task"));
        assert_eq!(value["actions"][0]["action"], json!("create"));
    }
}
