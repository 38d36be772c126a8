// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Direct-mutation plumbing: a user-initiated create/update/delete is a
//! one-action draft submitted and applied within the same request. Soft
//! warnings do not block a direct call - the user asked for the change
//! explicitly - but structural and referential failures surface normally.

use taskdeck_domain::entities::Actor;
use taskdeck_domain::CoreError;

use crate::application::changes::ApplyOutcome;
use crate::application::drafts::{ActionInput, SubmitDraft};
use crate::presentation::http::AppState;

/// Submits and applies a single action as the `user` actor.
pub async fn apply_single_action(
    state: &AppState,
    action: ActionInput,
) -> Result<ApplyOutcome, CoreError> {
    let submitted = state
        .drafts
        .submit(SubmitDraft {
            project_id: None,
            created_by: Actor::User,
            reason: None,
            actions: vec![action],
        })
        .await?;
    state
        .changes
        .apply_draft(submitted.draft.id.as_str(), Actor::User)
        .await
}
