// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tool Registry
//!
//! A domain-agnostic table of named operations an external reasoning engine
//! may invoke. Each tool carries a JSON-Schema parameter descriptor so the
//! catalog projects directly into the function-calling shape upstream APIs
//! expect.
//!
//! The category encodes the write policy, and the policy is what makes an
//! agent-driven system safe to operate:
//!
//! - `read` tools execute directly against the store;
//! - `write` tools never mutate - they synthesize draft actions, and the
//!   caller funnels those through the draft engine as a pending draft;
//! - `action` tools trigger operations that cannot be expressed as drafts
//!   (applying or discarding an already-created draft).
//!
//! Dispatch wraps handler failures into structured `{success: false,
//! error}` payloads so a retrying agent sees machine-readable failure
//! instead of a broken turn.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use taskdeck_domain::CoreError;

use crate::application::changes::ChangeEngine;
use crate::application::drafts::DraftEngine;
use crate::infrastructure::persistence::SqliteStore;

/// What a tool is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Read,
    Write,
    Action,
}

/// Shared handles a tool handler may use.
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<SqliteStore>,
    pub drafts: Arc<DraftEngine>,
    pub changes: Arc<ChangeEngine>,
}

type ToolHandler =
    Arc<dyn Fn(ToolContext, Value) -> BoxFuture<'static, Result<Value, CoreError>> + Send + Sync>;

/// One registered tool: name, description, JSON-Schema parameters,
/// category, handler.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
    pub category: ToolCategory,
    handler: ToolHandler,
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

impl ToolSpec {
    pub fn new<F, Fut>(
        name: &'static str,
        description: &'static str,
        parameters: Value,
        category: ToolCategory,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CoreError>> + Send + 'static,
    {
        Self {
            name,
            description,
            parameters,
            category,
            handler: Arc::new(move |ctx, args| Box::pin(handler(ctx, args))),
        }
    }
}

/// Immutable, name-keyed table of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; a duplicate name is a programming error surfaced
    /// at startup.
    pub fn register(&mut self, spec: ToolSpec) -> Result<(), CoreError> {
        if self.tools.contains_key(spec.name) {
            return Err(CoreError::configuration(format!(
                "tool '{}' registered twice",
                spec.name
            )));
        }
        self.tools.insert(spec.name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.values()
    }

    /// Projection into the function-calling descriptor shape:
    /// `{type: "function", function: {name, description, parameters}}`.
    pub fn to_openai_tools(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|spec| {
                json!({
                    "type": "function",
                    "function": {
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.parameters,
                    }
                })
            })
            .collect()
    }

    /// Dispatches one call. Never returns `Err`: failures come back as a
    /// structured payload the agent can read and retry on.
    pub async fn execute(&self, name: &str, ctx: ToolContext, args: Value) -> Value {
        let Some(spec) = self.tools.get(name) else {
            return failure_payload(&CoreError::validation(format!("unknown tool '{}'", name)));
        };
        debug!(tool = name, category = ?spec.category, "Dispatching tool call");
        match (spec.handler)(ctx, args).await {
            Ok(value) => value,
            Err(e) => failure_payload(&e),
        }
    }
}

/// Shapes an error as the structured failure payload tools return.
pub(crate) fn failure_payload(error: &CoreError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": error.kind().code(),
            "message": error.to_string(),
        }
    })
}
