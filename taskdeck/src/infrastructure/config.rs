// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Service Configuration
//!
//! Layered configuration: compiled defaults, then an optional TOML file,
//! then environment variables. The recognized variables are `DATABASE_URL`,
//! `PORT`, `OPENAI_API_KEY`, `OPENAI_BASE_URL`, and `OPENAI_MODEL`; unknown
//! variables are ignored.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use taskdeck_domain::CoreError;

pub const DEFAULT_PORT: u16 = 8788;

/// Settings for the OpenAI-compatible agent upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Bearer key for the upstream; the `/api/ai` endpoint refuses to run
    /// without one.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Upper bound on tool-call rounds inside one chat turn.
    pub max_tool_rounds: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tool_rounds: 6,
        }
    }
}

/// Root configuration for the server process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database_url: String,
    pub port: u16,
    pub agent: AgentSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://taskdeck.db".to_string(),
            port: DEFAULT_PORT,
            agent: AgentSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Loads defaults, merges the TOML file when given, then applies
    /// environment overrides.
    pub async fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    async fn from_file(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).await.map_err(|e| {
            CoreError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ServiceConfig = toml::from_str(&text).map_err(|e| {
            CoreError::configuration(format!("invalid config {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies recognized environment variables over the current values.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                self.database_url = url;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(parsed) => self.port = parsed,
                Err(_) => warn!("Ignoring non-numeric PORT value '{}'", port),
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.agent.api_key = Some(key);
            }
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.agent.base_url = base_url;
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                self.agent.model = model;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8788);
        assert!(config.database_url.starts_with("sqlite://"));
        assert!(config.agent.api_key.is_none());
    }

    #[tokio::test]
    async fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 9000\ndatabase_url = \"sqlite://custom.db\"\n\n[agent]\nmodel = \"gpt-4o\""
        )
        .unwrap();

        let config = ServiceConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url, "sqlite://custom.db");
        assert_eq!(config.agent.model, "gpt-4o");
        // Unspecified agent fields keep their defaults.
        assert_eq!(config.agent.max_tool_rounds, 6);
    }

    #[tokio::test]
    async fn malformed_file_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = ServiceConfig::from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
