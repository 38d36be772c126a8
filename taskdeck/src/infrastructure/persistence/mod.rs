// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite persistence: schema bootstrap, the row serializer, the store, and
//! the demo seed.

pub mod schema;
pub mod seed;
pub mod serializer;
pub mod store;

pub use store::{AuditFilter, DraftFilter, Page, SqliteStore, TaskFilter};
