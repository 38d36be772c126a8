// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TaskDeck Application Crate
//!
//! The application and infrastructure layers of the change-control core:
//!
//! - [`infrastructure`] - SQLite store and serializer, schema bootstrap,
//!   configuration, metrics, demo seed
//! - [`application`] - the draft engine, the change (apply/audit/rollback)
//!   engine, the agent tool registry, and the agent chat loop
//! - [`presentation`] - the HTTP facade
//!
//! Control flow for a write: HTTP facade (or tool registry, for agent
//! calls) -> draft engine (validate + persist pending) -> change engine
//! (one transaction: mutate + audit) -> store. Reads skip the engines and
//! hit the store directly.

pub mod application;
pub mod infrastructure;
pub mod presentation;
