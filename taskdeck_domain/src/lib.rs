// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TaskDeck Domain Layer
//!
//! Pure business logic for the change-control core: the entities that cross
//! the wire (projects, tasks, drafts, audit entries), the value objects that
//! guard their invariants, and the domain services that stay independent of
//! any runtime or storage choice.
//!
//! ## Layering
//!
//! This crate has no knowledge of SQLite, HTTP, or the agent protocol. The
//! application crate depends on it; never the other way around. The only
//! async surface here is the read-side repository ports in [`repositories`],
//! which draft validation uses to check referential integrity without caring
//! who implements the reads.
//!
//! ## Modules
//!
//! - [`entities`] - `Project`, `Task`, `Draft`, `AuditEntry` and their enums
//! - [`value_objects`] - `RecordId`, `WbsCode`
//! - [`services`] - millisecond timestamp serde, snapshot diffing, input
//!   sanitization
//! - [`error`] - `CoreError`, the single domain error type
//! - [`repositories`] - read-side ports implemented by the store

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{
    ActionKind, Actor, AuditAction, AuditEntry, Draft, DraftAction, DraftStatus, EntityKind,
    Project, Task, TaskPriority, TaskStatus,
};
pub use error::{CoreError, ErrorKind};
pub use value_objects::{RecordId, WbsCode};
