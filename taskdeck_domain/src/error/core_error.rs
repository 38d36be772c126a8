// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Error Types
//!
//! The single error type for the change-control core. Every fallible
//! operation in the domain, application, and infrastructure layers returns
//! `Result<_, CoreError>`; only the HTTP facade turns errors into wire
//! payloads, and only the binary turns them into exit codes.
//!
//! ## Design Principles
//!
//! - **Classified**: every variant maps to exactly one [`ErrorKind`], which
//!   is what the HTTP envelope and the agent protocol expose as the error
//!   `code`.
//! - **Cloneable**: errors carry owned strings so they can be logged,
//!   counted, and attached to responses without lifetime gymnastics.
//! - **Message discipline**: messages are short, human-readable, and never
//!   include secrets or raw SQL.
//!
//! Draft warnings are deliberately NOT errors - they are plain strings
//! collected by the draft engine and persisted on the draft row.

use serde::Serialize;
use thiserror::Error;

/// Domain-specific errors for the change-control core.
///
/// Variants are grouped by the four externally visible kinds (validation,
/// not-found, conflict, internal); the finer-grained variants exist so call
/// sites read naturally and logs stay searchable.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The externally visible classification of a [`CoreError`].
///
/// This is the `code` field of the HTTP error envelope and of tool-dispatch
/// failure payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Wire spelling of the kind, e.g. `"NOT_FOUND"`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl CoreError {
    /// Creates a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a new conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a new serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a new database error
    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Creates a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classifies the error for the wire envelope.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) | CoreError::Serialization(_) => ErrorKind::Validation,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Database(_)
            | CoreError::Configuration(_)
            | CoreError::Upstream(_)
            | CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True when retrying the same call could reasonably succeed.
    ///
    /// Submission is retry-safe (a retried submission creates a fresh
    /// draft); domain rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_) | CoreError::Upstream(_) | CoreError::Internal(_)
        )
    }
}
