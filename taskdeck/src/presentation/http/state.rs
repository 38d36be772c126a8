// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared handler state: one set of engines and services behind `Arc`s.

use std::sync::Arc;

use taskdeck_domain::CoreError;

use crate::application::agent::AgentService;
use crate::application::changes::ChangeEngine;
use crate::application::drafts::DraftEngine;
use crate::application::tools::{catalog, ToolContext, ToolRegistry};
use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::persistence::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub drafts: Arc<DraftEngine>,
    pub changes: Arc<ChangeEngine>,
    pub tools: Arc<ToolRegistry>,
    pub agent: Arc<AgentService>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    /// Wires the full service graph over one store.
    pub fn build(store: SqliteStore, config: &ServiceConfig) -> Result<Self, CoreError> {
        let store = Arc::new(store);
        let metrics = Arc::new(MetricsService::new()?);
        let drafts = Arc::new(DraftEngine::new(store.clone(), metrics.clone()));
        let changes = Arc::new(ChangeEngine::new(store.clone(), metrics.clone()));
        let tools = Arc::new(catalog::build_registry()?);
        let agent = Arc::new(AgentService::new(
            config.agent.clone(),
            tools.clone(),
            ToolContext {
                store: store.clone(),
                drafts: drafts.clone(),
                changes: changes.clone(),
            },
        ));
        Ok(Self {
            store,
            drafts,
            changes,
            tools,
            agent,
            metrics,
        })
    }
}
