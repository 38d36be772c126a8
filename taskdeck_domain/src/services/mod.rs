// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pure domain services: no IO, no runtime, fully unit-testable.

pub mod millis_serde;
pub mod sanitize;
pub mod state_diff;

pub use state_diff::{diff_states, DiffEntry};
