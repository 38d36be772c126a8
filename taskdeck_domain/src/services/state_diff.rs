// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Snapshot Diffing
//!
//! Audit entries store full before/after snapshots, not diffs. The diff is
//! computed on demand for display: a deep key-wise recursion over the two
//! snapshots producing one `{path, before, after}` row per differing leaf.
//! When a value changes shape (object on one side, leaf on the other) the
//! recursion stops and emits a single row at the containing path.

use serde::Serialize;
use serde_json::Value;

/// One differing leaf between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    /// Dotted path from the snapshot root, e.g. `"predecessors"` or
    /// `"metrics.progress"`. Empty string when the roots themselves differ
    /// in shape.
    pub path: String,
    pub before: Value,
    pub after: Value,
}

/// Computes the field-level diff between two optional snapshots.
///
/// `None` is treated as JSON null, so a create diffs as `null -> {..}` in a
/// single root row and a delete symmetrically.
pub fn diff_states(before: Option<&Value>, after: Option<&Value>) -> Vec<DiffEntry> {
    let before = before.unwrap_or(&Value::Null);
    let after = after.unwrap_or(&Value::Null);
    let mut entries = Vec::new();
    walk("", before, after, &mut entries);
    entries
}

fn walk(path: &str, before: &Value, after: &Value, out: &mut Vec<DiffEntry>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut keys: Vec<&String> = b.keys().chain(a.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                let bv = b.get(key).unwrap_or(&Value::Null);
                let av = a.get(key).unwrap_or(&Value::Null);
                walk(&child_path, bv, av, out);
            }
        }
        _ => {
            // Leaf on at least one side: arrays and scalars compare whole.
            if before != after {
                out.push(DiffEntry {
                    path: path.to_string(),
                    before: before.clone(),
                    after: after.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn identical_snapshots_produce_no_entries() {
        let snap = json!({"id": "t1", "title": "x", "completion": 50});
        assert!(diff_states(Some(&snap), Some(&snap)).is_empty());
    }

    #[test]
    fn changed_leaves_each_get_a_row() {
        let before = json!({"status": "TODO", "completion": 0, "title": "a"});
        let after = json!({"status": "DONE", "completion": 100, "title": "a"});
        let diff = diff_states(Some(&before), Some(&after));
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].path, "completion");
        assert_eq!(diff[0].before, json!(0));
        assert_eq!(diff[0].after, json!(100));
        assert_eq!(diff[1].path, "status");
    }

    #[test]
    fn arrays_compare_whole() {
        let before = json!({"predecessors": ["1.1"]});
        let after = json!({"predecessors": ["1.1", "1.2"]});
        let diff = diff_states(Some(&before), Some(&after));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "predecessors");
    }

    #[test]
    fn object_to_leaf_collapses_to_containing_path() {
        let before = json!({"meta": {"a": 1}});
        let after = json!({"meta": null});
        let diff = diff_states(Some(&before), Some(&after));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "meta");
        assert_eq!(diff[0].before, json!({"a": 1}));
    }

    #[test]
    fn create_and_delete_diff_at_keys() {
        let row = json!({"id": "p1", "name": "Alpha"});
        let create = diff_states(None, Some(&row));
        assert_eq!(create.len(), 1);
        assert_eq!(create[0].path, "");
        assert_eq!(create[0].before, Value::Null);

        let delete = diff_states(Some(&row), None);
        assert_eq!(delete.len(), 1);
        assert_eq!(delete[0].after, Value::Null);
    }

    #[test]
    fn missing_key_reads_as_null() {
        let before = json!({"assignee": "kim"});
        let after = json!({});
        let diff = diff_states(Some(&before), Some(&after));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "assignee");
        assert_eq!(diff[0].after, Value::Null);
    }

    proptest! {
        #[test]
        fn self_diff_is_empty(entries in proptest::collection::hash_map("[a-z]{1,6}", -1000i64..1000, 0..8)) {
            let snap = serde_json::to_value(&entries).unwrap();
            prop_assert!(diff_states(Some(&snap), Some(&snap)).is_empty());
        }

        #[test]
        fn diff_rows_never_exceed_key_union(
            before in proptest::collection::hash_map("[a-z]{1,4}", -50i64..50, 0..6),
            after in proptest::collection::hash_map("[a-z]{1,4}", -50i64..50, 0..6),
        ) {
            let b = serde_json::to_value(&before).unwrap();
            let a = serde_json::to_value(&after).unwrap();
            let union: std::collections::HashSet<_> =
                before.keys().chain(after.keys()).collect();
            prop_assert!(diff_states(Some(&b), Some(&a)).len() <= union.len());
        }
    }
}
