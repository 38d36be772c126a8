// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The change engine: the only subsystem allowed to mutate projects and
//! tasks, always inside one transaction and always with audit emission.

pub mod engine;

pub use engine::{ApplyOutcome, ChangeEngine};
