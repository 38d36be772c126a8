// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::collections::HashSet;

use async_trait::async_trait;

use crate::entities::{Project, Task};
use crate::error::CoreError;

/// Read access to projects, as needed by draft validation and read tools.
#[async_trait]
pub trait ProjectReader: Send + Sync {
    async fn find_project(&self, id: &str) -> Result<Option<Project>, CoreError>;

    async fn project_exists(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.find_project(id).await?.is_some())
    }
}

/// Read access to tasks, as needed by draft validation and read tools.
#[async_trait]
pub trait TaskReader: Send + Sync {
    async fn find_task(&self, id: &str) -> Result<Option<Task>, CoreError>;

    /// All currently referenceable task locators (ids and WBS codes), used
    /// to check predecessor references in one pass.
    async fn task_refs(&self) -> Result<TaskRefs, CoreError>;
}

/// The set of locators a predecessor list may point at.
#[derive(Debug, Default, Clone)]
pub struct TaskRefs {
    ids: HashSet<String>,
    wbs: HashSet<String>,
}

impl TaskRefs {
    pub fn insert_id(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    pub fn insert_wbs(&mut self, code: impl Into<String>) {
        self.wbs.insert(code.into());
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.ids.contains(reference) || self.wbs.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.ids.len() + self.wbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.wbs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_match_ids_and_wbs() {
        let mut refs = TaskRefs::default();
        refs.insert_id("t1");
        refs.insert_wbs("1.2");
        assert!(refs.contains("t1"));
        assert!(refs.contains("1.2"));
        assert!(!refs.contains("t2"));
        assert_eq!(refs.len(), 2);
    }
}
