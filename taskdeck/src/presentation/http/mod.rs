// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # HTTP Facade
//!
//! Thin REST mapping over the engines. Handlers translate between wire
//! payloads and engine calls; all domain decisions live below this layer.
//!
//! Direct mutation endpoints (`POST /api/projects`, `PATCH /api/tasks/{id}`,
//! ...) synthesize an implicit one-action draft and apply it in the same
//! request, so the audit log is uniform: every entry has a `sourceDraftId`
//! whether the change came from a reviewed draft or a direct call.

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod ai;
pub mod audit;
pub mod direct;
pub mod drafts;
pub mod envelope;
pub mod ops;
pub mod projects;
pub mod state;
pub mod tasks;

pub use state::AppState;

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{id}",
            get(projects::fetch)
                .patch(projects::update)
                .delete(projects::remove),
        )
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/{id}",
            get(tasks::fetch).patch(tasks::update).delete(tasks::remove),
        )
        .route("/api/drafts", get(drafts::list).post(drafts::submit))
        .route("/api/drafts/{id}", get(drafts::fetch))
        .route("/api/drafts/{id}/apply", post(drafts::apply))
        .route("/api/drafts/{id}/discard", post(drafts::discard))
        .route("/api/audit", get(audit::list))
        .route("/api/audit/{id}", get(audit::fetch))
        .route("/api/audit/{id}/rollback", post(audit::rollback))
        .route("/api/ai", post(ai::chat))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    state
        .metrics
        .observe_http(&method, response.status().as_u16());
    response
}
