// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # WBS Codes
//!
//! A Work Breakdown Structure code is a dotted-numeric string like `"1.2.3"`
//! used as a human-facing task locator. Codes are informational, not unique:
//! tasks may be referenced by id or by WBS in predecessor lists, and the
//! engine never rewrites one into the other.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::CoreError;

/// Parsed dotted-numeric WBS code.
///
/// Invariant: at least one segment; every segment a base-10 integer with no
/// sign, no leading `+`, no empty components (`"1..2"` is rejected).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WbsCode {
    segments: Vec<u32>,
}

impl WbsCode {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("wbs code cannot be empty"));
        }
        let segments = trimmed
            .split('.')
            .map(|seg| {
                if seg.is_empty() || !seg.chars().all(|c| c.is_ascii_digit()) {
                    return Err(CoreError::validation(format!(
                        "wbs code '{}' is not dotted-numeric",
                        s
                    )));
                }
                seg.parse::<u32>().map_err(|_| {
                    CoreError::validation(format!("wbs segment '{}' is out of range", seg))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Cheap shape check without allocating a parsed code.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Depth in the breakdown tree; `"1.2.3"` has depth 3.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The parent code, if any; `"1.2.3"` -> `"1.2"`.
    pub fn parent(&self) -> Option<WbsCode> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(WbsCode {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl Display for WbsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for WbsCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WbsCode {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WbsCode> for String {
    fn from(code: WbsCode) -> Self {
        code.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_dotted_numeric() {
        let code = WbsCode::parse("1.2.3").unwrap();
        assert_eq!(code.segments(), &[1, 2, 3]);
        assert_eq!(code.depth(), 3);
        assert_eq!(code.to_string(), "1.2.3");
    }

    #[test]
    fn single_segment_has_no_parent() {
        let code = WbsCode::parse("7").unwrap();
        assert_eq!(code.parent(), None);
    }

    #[test]
    fn parent_drops_last_segment() {
        let code = WbsCode::parse("4.1.9").unwrap();
        assert_eq!(code.parent().unwrap().to_string(), "4.1");
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in ["", " ", "1..2", ".1", "1.", "a.b", "1.-2", "1.2x"] {
            assert!(!WbsCode::is_valid(bad), "expected '{}' to be invalid", bad);
        }
    }

    proptest! {
        #[test]
        fn roundtrips_through_display(segs in proptest::collection::vec(0u32..10_000, 1..6)) {
            let text = segs
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(".");
            let code = WbsCode::parse(&text).unwrap();
            prop_assert_eq!(code.to_string(), text);
            prop_assert_eq!(code.segments(), segs.as_slice());
        }
    }
}
