// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Record Identifiers
//!
//! Every row in the system - project, task, draft, audit entry - is keyed by
//! an opaque short string. Identifiers generated by the core are lowercase
//! ULIDs, which sort by creation time and are safe in URLs; identifiers
//! supplied by callers (imports, re-inserts during rollback) are accepted
//! verbatim as long as they are non-empty, because audit snapshots must
//! round-trip ids byte-for-byte.
//!
//! `RecordId` is therefore a thin validated wrapper over the string form
//! rather than over a parsed ULID: parsing would reject foreign ids that the
//! system is contractually required to preserve.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use ulid::Ulid;

use crate::error::CoreError;

/// Opaque identifier for any persisted record.
///
/// Invariant: the inner string is non-empty and contains no whitespace.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh id: a lowercase ULID.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }

    /// Wraps a caller-supplied id, rejecting empty or whitespace-bearing
    /// strings.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(CoreError::validation("record id cannot be empty"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(CoreError::validation(format!(
                "record id '{}' must not contain whitespace",
                s
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_lowercase_and_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), a.as_str().to_lowercase());
        assert_eq!(a.as_str().len(), 26);
    }

    #[test]
    fn parse_preserves_foreign_ids() {
        let id = RecordId::parse("proj-42").unwrap();
        assert_eq!(id.as_str(), "proj-42");
    }

    #[test]
    fn parse_rejects_empty_and_whitespace() {
        assert!(RecordId::parse("").is_err());
        assert!(RecordId::parse("   ").is_err());
        assert!(RecordId::parse("a b").is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = RecordId::parse("t1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t1\"");
        let back: RecordId = serde_json::from_str("\"t1\"").unwrap();
        assert_eq!(back, id);
    }
}
