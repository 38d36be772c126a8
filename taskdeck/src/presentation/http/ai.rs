// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Agent dispatch endpoint.

use axum::extract::State;

use crate::application::agent::{AgentReply, AiRequest};
use crate::presentation::http::envelope::{ok, ApiResult, AppJson};
use crate::presentation::http::AppState;

pub async fn chat(
    State(state): State<AppState>,
    AppJson(body): AppJson<AiRequest>,
) -> ApiResult<AgentReply> {
    ok(state.agent.chat(body).await?)
}
