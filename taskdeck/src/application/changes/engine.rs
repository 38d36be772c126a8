// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Change Engine
//!
//! The single mutator of projects and tasks. Two operations:
//!
//! - `apply_draft`: executes an approved draft's actions in declared order
//!   inside one transaction, emitting one audit entry per effected row
//!   (cascade deletes included) and flipping the draft to `applied`. Any
//!   per-action failure aborts the whole transaction; the draft stays
//!   pending and no partial writes or audit entries survive.
//! - `rollback_audit`: synthesizes and applies the inverse of one audit
//!   entry, recording the reversal as a new `rollback` entry so the log
//!   stays append-only.
//!
//! Every audit entry carries full before/after snapshots in wire shape -
//! not diffs - so entries alone are sufficient for display and reversal.
//! All entries of one apply share the transaction-start timestamp; the
//! `seq` column breaks ties in insertion order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteConnection;
use tracing::{info, warn};

use taskdeck_domain::entities::draft::DraftAction;
use taskdeck_domain::entities::{
    ActionKind, Actor, AuditAction, AuditEntry, Draft, DraftStatus, EntityKind, Project, Task,
    TaskPriority, TaskStatus,
};
use taskdeck_domain::{CoreError, RecordId};

use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::persistence::{store, SqliteStore};

/// Result of applying a draft: the applied draft and the audit entries it
/// produced, in emission order.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub draft: Draft,
    pub entries: Vec<AuditEntry>,
}

pub struct ChangeEngine {
    store: Arc<SqliteStore>,
    metrics: Arc<MetricsService>,
}

/// Per-apply context threaded through the action executors.
struct ApplyCtx {
    draft_id: RecordId,
    draft_project_id: Option<RecordId>,
    reason: Option<String>,
    actor: Actor,
    timestamp: DateTime<Utc>,
}

impl ApplyCtx {
    fn entry(
        &self,
        entity_type: EntityKind,
        entity_id: &str,
        project_id: Option<RecordId>,
        action: AuditAction,
        before: Option<Value>,
        after: Option<Value>,
    ) -> AuditEntry {
        AuditEntry {
            id: RecordId::generate(),
            project_id,
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            actor: self.actor,
            before,
            after,
            reason: self.reason.clone(),
            timestamp: self.timestamp,
            source_draft_id: Some(self.draft_id.clone()),
            rollback_of_audit_id: None,
        }
    }
}

impl ChangeEngine {
    pub fn new(store: Arc<SqliteStore>, metrics: Arc<MetricsService>) -> Self {
        Self { store, metrics }
    }

    /// Applies a pending draft atomically. Fails with `Conflict` when the
    /// draft is no longer pending, `NotFound` when an action's target is
    /// gone, `Validation` when a create lacks its required fields.
    pub async fn apply_draft(&self, draft_id: &str, actor: Actor) -> Result<ApplyOutcome, CoreError> {
        let mut tx = self
            .store
            .pool()
            .begin()
            .await
            .map_err(|e| CoreError::database_error(format!("begin apply: {}", e)))?;

        // Re-read inside the transaction; the pre-flight state a caller saw
        // may be stale by now.
        let mut draft = store::get_draft_row(&mut tx, draft_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("draft {} not found", draft_id)))?;
        if draft.status != DraftStatus::Pending {
            return Err(CoreError::conflict(format!(
                "draft {} is {}, not pending",
                draft.id,
                draft.status.as_str()
            )));
        }

        let ctx = ApplyCtx {
            draft_id: draft.id.clone(),
            draft_project_id: draft.project_id.clone(),
            reason: draft.reason.clone(),
            actor,
            timestamp: Utc::now(),
        };

        let mut entries = Vec::new();
        for action in &draft.actions {
            self.execute_action(&mut tx, &ctx, action, &mut entries)
                .await?;
        }
        for entry in &entries {
            store::insert_audit(&mut tx, entry).await?;
        }

        draft.mark_applied(ctx.timestamp)?;
        store::set_draft_status(&mut tx, &draft).await?;

        tx.commit()
            .await
            .map_err(|e| CoreError::database_error(format!("commit apply: {}", e)))?;

        self.metrics.drafts_applied.inc();
        self.metrics.audit_entries.inc_by(entries.len() as u64);
        info!(
            draft_id = %draft.id,
            actor = actor.as_str(),
            entries = entries.len(),
            "Draft applied"
        );

        Ok(ApplyOutcome { draft, entries })
    }

    async fn execute_action(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        match (action.entity_type, action.action) {
            (EntityKind::Project, ActionKind::Create) => {
                self.create_project(conn, ctx, action, entries).await
            }
            (EntityKind::Project, ActionKind::Update) => {
                self.update_project(conn, ctx, action, entries).await
            }
            (EntityKind::Project, ActionKind::Delete) => {
                self.delete_project(conn, ctx, action, entries).await
            }
            (EntityKind::Task, ActionKind::Create) => {
                self.create_task(conn, ctx, action, entries).await
            }
            (EntityKind::Task, ActionKind::Update) => {
                self.update_task(conn, ctx, action, entries).await
            }
            (EntityKind::Task, ActionKind::Delete) => {
                self.delete_task(conn, ctx, action, entries).await
            }
        }
    }

    async fn create_project(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let after = required_after(action)?;
        let id = match action.entity_id.as_deref() {
            Some(id) => RecordId::parse(id)?,
            None => RecordId::generate(),
        };
        let name = after
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CoreError::validation("project name cannot be empty"))?;
        let project = Project {
            id: id.clone(),
            name: name.to_string(),
            description: text_field(after, "description"),
            icon: text_field(after, "icon"),
            created_at: ctx.timestamp,
        };
        store::insert_project(conn, &project).await?;
        entries.push(ctx.entry(
            EntityKind::Project,
            id.as_str(),
            Some(id.clone()),
            AuditAction::Create,
            None,
            Some(project.snapshot()?),
        ));
        Ok(())
    }

    async fn update_project(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let after = required_after(action)?;
        let id = required_entity_id(action)?;
        let current = store::get_project_row(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("project {} not found", id)))?;
        let merged = current.merged_with(after)?;
        store::update_project(conn, &merged).await?;
        entries.push(ctx.entry(
            EntityKind::Project,
            id,
            Some(merged.id.clone()),
            AuditAction::Update,
            Some(current.snapshot()?),
            Some(merged.snapshot()?),
        ));
        Ok(())
    }

    async fn delete_project(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let id = required_entity_id(action)?;
        let project = store::get_project_row(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("project {} not found", id)))?;

        // Children first: each cascaded task gets its own entry, so it can
        // later be restored from its own snapshot.
        let tasks = store::tasks_of_project(conn, id).await?;
        for task in &tasks {
            store::delete_task_row(conn, task.id.as_str()).await?;
            entries.push(ctx.entry(
                EntityKind::Task,
                task.id.as_str(),
                Some(task.project_id.clone()),
                AuditAction::Delete,
                Some(task.snapshot()?),
                None,
            ));
        }
        store::delete_project_row(conn, id).await?;
        entries.push(ctx.entry(
            EntityKind::Project,
            id,
            Some(project.id.clone()),
            AuditAction::Delete,
            Some(project.snapshot()?),
            None,
        ));
        Ok(())
    }

    async fn create_task(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let after = required_after(action)?;
        let project_id = after
            .get("projectId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(RecordId::parse)
            .transpose()?
            .or_else(|| ctx.draft_project_id.clone())
            .ok_or_else(|| CoreError::validation("task create missing projectId"))?;
        if store::get_project_row(conn, project_id.as_str())
            .await?
            .is_none()
        {
            return Err(CoreError::not_found(format!(
                "project {} not found",
                project_id
            )));
        }

        let id = match action.entity_id.as_deref() {
            Some(id) => RecordId::parse(id)?,
            None => RecordId::generate(),
        };
        let base = Task {
            id: id.clone(),
            project_id: project_id.clone(),
            title: String::new(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            created_at: ctx.timestamp,
            start_date: None,
            due_date: None,
            completion: 0,
            assignee: None,
            wbs: None,
            is_milestone: false,
            predecessors: vec![],
        };
        let mut task = base.merged_with(after)?;
        task.clamp_completion();
        store::insert_task(conn, &task).await?;
        entries.push(ctx.entry(
            EntityKind::Task,
            id.as_str(),
            Some(project_id),
            AuditAction::Create,
            None,
            Some(task.snapshot()?),
        ));
        Ok(())
    }

    async fn update_task(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let after = required_after(action)?;
        let id = required_entity_id(action)?;
        let current = store::get_task_row(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("task {} not found", id)))?;
        let mut merged = current.merged_with(after)?;
        merged.clamp_completion();
        store::update_task(conn, &merged).await?;
        entries.push(ctx.entry(
            EntityKind::Task,
            id,
            Some(merged.project_id.clone()),
            AuditAction::Update,
            Some(current.snapshot()?),
            Some(merged.snapshot()?),
        ));
        Ok(())
    }

    async fn delete_task(
        &self,
        conn: &mut SqliteConnection,
        ctx: &ApplyCtx,
        action: &DraftAction,
        entries: &mut Vec<AuditEntry>,
    ) -> Result<(), CoreError> {
        let id = required_entity_id(action)?;
        let task = store::get_task_row(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("task {} not found", id)))?;
        store::delete_task_row(conn, id).await?;
        entries.push(ctx.entry(
            EntityKind::Task,
            id,
            Some(task.project_id.clone()),
            AuditAction::Delete,
            Some(task.snapshot()?),
            None,
        ));
        Ok(())
    }

    /// Synthesizes and applies the inverse of one committed audit entry.
    ///
    /// Exactly one entry per call: a project-delete's cascaded children have
    /// their own entries and are restored individually. Rolling back a
    /// `rollback` entry is disallowed.
    pub async fn rollback_audit(
        &self,
        audit_id: &str,
        actor: Actor,
    ) -> Result<AuditEntry, CoreError> {
        let target = self
            .store
            .get_audit(audit_id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("audit entry {} not found", audit_id)))?;
        if target.is_rollback() {
            return Err(CoreError::validation(
                "rollback entries cannot be rolled back",
            ));
        }

        let mut tx = self
            .store
            .pool()
            .begin()
            .await
            .map_err(|e| CoreError::database_error(format!("begin rollback: {}", e)))?;

        let (before, after) = match target.action {
            AuditAction::Create => self.invert_create(&mut tx, &target).await?,
            AuditAction::Delete => self.invert_delete(&mut tx, &target).await?,
            AuditAction::Update => self.invert_update(&mut tx, &target).await?,
            AuditAction::Rollback => unreachable!("checked above"),
        };

        let entry = AuditEntry {
            id: RecordId::generate(),
            project_id: target.project_id.clone(),
            entity_type: target.entity_type,
            entity_id: target.entity_id.clone(),
            action: AuditAction::Rollback,
            actor,
            before,
            after,
            reason: None,
            timestamp: Utc::now(),
            source_draft_id: None,
            rollback_of_audit_id: Some(target.id.clone()),
        };
        store::insert_audit(&mut tx, &entry).await?;

        tx.commit()
            .await
            .map_err(|e| CoreError::database_error(format!("commit rollback: {}", e)))?;

        self.metrics.rollbacks.inc();
        self.metrics.audit_entries.inc();
        info!(
            audit_id = %target.id,
            rollback_id = %entry.id,
            action = target.action.as_str(),
            "Audit entry rolled back"
        );
        Ok(entry)
    }

    /// Inverse of a create: remove the entity again.
    async fn invert_create(
        &self,
        conn: &mut SqliteConnection,
        target: &AuditEntry,
    ) -> Result<(Option<Value>, Option<Value>), CoreError> {
        match target.entity_type {
            EntityKind::Project => {
                let current = store::get_project_row(conn, &target.entity_id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::conflict(format!(
                            "project {} already removed",
                            target.entity_id
                        ))
                    })?;
                // A single-entry rollback never cascades; a project that has
                // since acquired tasks must be emptied first.
                let children = store::count_project_tasks(conn, &target.entity_id).await?;
                if children > 0 {
                    return Err(CoreError::conflict(format!(
                        "project {} still owns {} task(s)",
                        target.entity_id, children
                    )));
                }
                store::delete_project_row(conn, &target.entity_id).await?;
                Ok((Some(current.snapshot()?), None))
            }
            EntityKind::Task => {
                let current = store::get_task_row(conn, &target.entity_id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::conflict(format!("task {} already removed", target.entity_id))
                    })?;
                store::delete_task_row(conn, &target.entity_id).await?;
                Ok((Some(current.snapshot()?), None))
            }
        }
    }

    /// Inverse of a delete: re-insert the before snapshot under its
    /// original id.
    async fn invert_delete(
        &self,
        conn: &mut SqliteConnection,
        target: &AuditEntry,
    ) -> Result<(Option<Value>, Option<Value>), CoreError> {
        let snapshot = target.before.clone().ok_or_else(|| {
            CoreError::internal_error(format!(
                "delete audit entry {} has no before snapshot",
                target.id
            ))
        })?;
        match target.entity_type {
            EntityKind::Project => {
                let project: Project = serde_json::from_value(snapshot.clone()).map_err(|e| {
                    CoreError::serialization(format!("stored project snapshot invalid: {}", e))
                })?;
                if store::get_project_row(conn, project.id.as_str())
                    .await?
                    .is_some()
                {
                    return Err(CoreError::conflict(format!(
                        "project {} already exists",
                        project.id
                    )));
                }
                store::insert_project(conn, &project).await?;
            }
            EntityKind::Task => {
                let task: Task = serde_json::from_value(snapshot.clone()).map_err(|e| {
                    CoreError::serialization(format!("stored task snapshot invalid: {}", e))
                })?;
                if store::get_task_row(conn, task.id.as_str()).await?.is_some() {
                    return Err(CoreError::conflict(format!(
                        "task {} already exists",
                        task.id
                    )));
                }
                if store::get_project_row(conn, task.project_id.as_str())
                    .await?
                    .is_none()
                {
                    return Err(CoreError::conflict(format!(
                        "project {} no longer exists; restore it first",
                        task.project_id
                    )));
                }
                store::insert_task(conn, &task).await?;
            }
        }
        Ok((None, Some(snapshot)))
    }

    /// Inverse of an update: write the before snapshot back over the row.
    async fn invert_update(
        &self,
        conn: &mut SqliteConnection,
        target: &AuditEntry,
    ) -> Result<(Option<Value>, Option<Value>), CoreError> {
        let snapshot = target.before.clone().ok_or_else(|| {
            CoreError::internal_error(format!(
                "update audit entry {} has no before snapshot",
                target.id
            ))
        })?;
        match target.entity_type {
            EntityKind::Project => {
                let current = store::get_project_row(conn, &target.entity_id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::conflict(format!("project {} no longer exists", target.entity_id))
                    })?;
                let restored: Project = serde_json::from_value(snapshot.clone()).map_err(|e| {
                    CoreError::serialization(format!("stored project snapshot invalid: {}", e))
                })?;
                store::update_project(conn, &restored).await?;
                Ok((Some(current.snapshot()?), Some(snapshot)))
            }
            EntityKind::Task => {
                let current = store::get_task_row(conn, &target.entity_id)
                    .await?
                    .ok_or_else(|| {
                        CoreError::conflict(format!("task {} no longer exists", target.entity_id))
                    })?;
                let restored: Task = serde_json::from_value(snapshot.clone()).map_err(|e| {
                    CoreError::serialization(format!("stored task snapshot invalid: {}", e))
                })?;
                if restored.project_id != current.project_id {
                    warn!(
                        task_id = %restored.id,
                        "Rollback restores a task under a different project"
                    );
                }
                store::update_task(conn, &restored).await?;
                Ok((Some(current.snapshot()?), Some(snapshot)))
            }
        }
    }
}

fn required_after(action: &DraftAction) -> Result<&serde_json::Map<String, Value>, CoreError> {
    action.after.as_ref().ok_or_else(|| {
        CoreError::validation(format!(
            "{} {} action requires an 'after' object",
            action.entity_type.as_str(),
            action.action.as_str()
        ))
    })
}

fn required_entity_id(action: &DraftAction) -> Result<&str, CoreError> {
    action.entity_id.as_deref().ok_or_else(|| {
        CoreError::validation(format!(
            "{} {} action requires an entityId",
            action.entity_type.as_str(),
            action.action.as_str()
        ))
    })
}

fn text_field(after: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    after.get(key).and_then(Value::as_str).map(str::to_string)
}
