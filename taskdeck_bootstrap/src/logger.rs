// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Logging
//!
//! Early-startup logging runs before (and independently of) the tracing
//! subscriber: configuration errors and bind failures must be visible even
//! when subscriber initialization itself is what failed. `BootstrapLogger`
//! decouples the startup sequence from any particular sink; production uses
//! the console logger, tests capture messages.

use tracing_subscriber::EnvFilter;

/// Minimal logging surface for the startup sequence.
pub trait BootstrapLogger: Send + Sync {
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
}

/// Logs through tracing with a fixed target, falling back to stderr for
/// errors raised before the subscriber exists.
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::with_prefix("taskdeck")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "bootstrap", "[{}] {}", self.prefix, message);
        eprintln!("[{}] error: {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }
}

/// Discards everything; for embedding contexts that own their logging.
pub struct NoOpLogger;

impl NoOpLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapLogger for NoOpLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug, default
/// info. Returns quietly when a subscriber is already installed (tests).
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskdeck={0},tower_http={0}", default_level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
pub struct CapturingLogger {
    messages: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(test)]
impl CapturingLogger {
    pub fn new() -> Self {
        Self {
            messages: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().expect("logger mutex poisoned").clone()
    }

    fn push(&self, level: &str, message: &str) {
        self.messages
            .lock()
            .expect("logger mutex poisoned")
            .push((level.to_string(), message.to_string()));
    }
}

#[cfg(test)]
impl BootstrapLogger for CapturingLogger {
    fn error(&self, message: &str) {
        self.push("error", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }

    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn debug(&self, message: &str) {
        self.push("debug", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_logger_records_in_order() {
        let logger = CapturingLogger::new();
        logger.info("starting");
        logger.error("bind failed");
        let messages = logger.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ("info".to_string(), "starting".to_string()));
        assert_eq!(messages[1].0, "error");
    }

    #[test]
    fn init_tracing_is_reentrant() {
        init_tracing(false);
        init_tracing(true); // second call must not panic
    }
}
