// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Agent Service
//!
//! Drives one chat turn against an OpenAI-compatible upstream: send the
//! conversation plus the tool catalog, dispatch any tool calls the model
//! makes, feed the results back, and repeat until the model answers in
//! prose or the round limit is hit.
//!
//! The write policy is enforced here, not trusted to the model: a write
//! tool's output is only ever a proposal, which this service funnels
//! through the draft engine. The model learns the resulting draft id from
//! the tool result and may then ask for `applyChanges` - but whatever it
//! does, nothing reaches the store without a draft and an audit trail.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use taskdeck_domain::entities::Actor;
use taskdeck_domain::CoreError;

use crate::application::agent::protocol::{ChatMessage, ChatRequest, ChatResponse};
use crate::application::drafts::{ActionInput, DraftEngine, SubmitDraft, SubmittedDraft};
use crate::application::tools::registry::{failure_payload, ToolCategory, ToolContext, ToolRegistry};
use crate::infrastructure::config::AgentSettings;

const SYSTEM_PROMPT: &str = "You are the planning assistant of a project and task \
management system. Use the provided tools to inspect projects and tasks. Write \
tools never change anything directly: they produce a pending draft that a human \
reviews, and the tool result tells you the draft id and any warnings. Only call \
applyChanges when the user explicitly asked for the change to be carried out. \
Keep answers short and concrete.";

/// Body of `POST /api/ai`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    pub message: String,
    #[serde(default)]
    pub system_context: Option<String>,
}

/// Prior conversation turns as the client stores them.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// One dispatched tool call, reported back to the client for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub tool: String,
    pub success: bool,
}

/// Outcome of one chat turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub reply: String,
    pub draft_ids: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

pub struct AgentService {
    client: reqwest::Client,
    settings: AgentSettings,
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
}

impl AgentService {
    pub fn new(settings: AgentSettings, registry: Arc<ToolRegistry>, ctx: ToolContext) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            registry,
            ctx,
        }
    }

    /// Runs one chat turn. Fails with a configuration error when no
    /// upstream key is set - tool dispatch itself needs no upstream.
    pub async fn chat(&self, request: AiRequest) -> Result<AgentReply, CoreError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| CoreError::configuration("agent upstream not configured"))?;

        let mut messages = Vec::with_capacity(request.history.len() + 3);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        if let Some(context) = request
            .system_context
            .as_deref()
            .filter(|context| !context.trim().is_empty())
        {
            messages.push(ChatMessage::system(context));
        }
        for turn in &request.history {
            match turn.role.as_str() {
                "user" => messages.push(ChatMessage::user(turn.content.clone())),
                "assistant" => messages.push(ChatMessage::assistant(turn.content.clone())),
                other => debug!(role = other, "Skipping history turn with unknown role"),
            }
        }
        messages.push(ChatMessage::user(request.message));

        let tools = self.registry.to_openai_tools();
        let mut draft_ids = Vec::new();
        let mut records = Vec::new();

        for round in 0..self.settings.max_tool_rounds {
            let response = self.complete(api_key, &messages, &tools).await?;
            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::upstream("chat completion returned no choices"))?;
            let message = choice.message;

            let Some(calls) = message.tool_calls.clone().filter(|calls| !calls.is_empty())
            else {
                return Ok(AgentReply {
                    reply: message.content.unwrap_or_default(),
                    draft_ids,
                    tool_calls: records,
                });
            };

            debug!(round, calls = calls.len(), "Model requested tool calls");
            messages.push(message);
            for call in calls {
                let args: Value =
                    serde_json::from_str(call.function.arguments.as_str()).unwrap_or(json!({}));
                let result = self
                    .dispatch_tool(&call.function.name, args, &mut draft_ids)
                    .await;
                records.push(ToolCallRecord {
                    tool: call.function.name.clone(),
                    success: result.get("success") == Some(&Value::Bool(true)),
                });
                messages.push(ChatMessage::tool(call.id, result.to_string()));
            }
        }

        warn!(
            rounds = self.settings.max_tool_rounds,
            "Agent hit the tool-round limit without a final answer"
        );
        Ok(AgentReply {
            reply: "I ran out of tool-call rounds before reaching an answer; \
                    the drafts created so far are listed and pending review."
                .to_string(),
            draft_ids,
            tool_calls: records,
        })
    }

    async fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChatResponse, CoreError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.settings.model,
            messages,
            tools,
            tool_choice: Some("auto"),
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::upstream(format!("chat completion request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CoreError::upstream(format!(
                "chat completion returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }
        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CoreError::upstream(format!("chat completion body invalid: {}", e)))
    }

    /// Dispatches one tool call, funneling write proposals into a pending
    /// draft. Always returns a payload - failures stay structured so the
    /// model can recover.
    pub(crate) async fn dispatch_tool(
        &self,
        name: &str,
        args: Value,
        draft_ids: &mut Vec<String>,
    ) -> Value {
        let payload = self.registry.execute(name, self.ctx.clone(), args).await;
        let is_write = self
            .registry
            .get(name)
            .is_some_and(|spec| spec.category == ToolCategory::Write);
        if !is_write || payload.get("success") != Some(&Value::Bool(true)) {
            return payload;
        }

        match self.submit_proposal(&payload).await {
            Ok(submitted) => {
                draft_ids.push(submitted.draft.id.to_string());
                info!(
                    tool = name,
                    draft_id = %submitted.draft.id,
                    warnings = submitted.warnings.len(),
                    "Write tool proposal captured as pending draft"
                );
                json!({
                    "success": true,
                    "draft": submitted.draft,
                    "warnings": submitted.warnings,
                })
            }
            Err(e) => failure_payload(&e),
        }
    }

    async fn submit_proposal(&self, payload: &Value) -> Result<SubmittedDraft, CoreError> {
        let actions: Vec<ActionInput> = serde_json::from_value(
            payload
                .get("proposedActions")
                .cloned()
                .unwrap_or(Value::Null),
        )
        .map_err(|e| CoreError::validation(format!("proposed actions malformed: {}", e)))?;
        let request = SubmitDraft {
            project_id: payload
                .get("projectId")
                .and_then(Value::as_str)
                .map(str::to_string),
            created_by: Actor::Agent,
            reason: payload
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string),
            actions,
        };
        self.drafts().submit(request).await
    }

    fn drafts(&self) -> &DraftEngine {
        &self.ctx.drafts
    }
}
