// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared helpers for the integration tests: an in-memory application
//! state and JSON-level conveniences for driving the engines and router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use taskdeck::application::drafts::{SubmitDraft, SubmittedDraft};
use taskdeck::infrastructure::config::ServiceConfig;
use taskdeck::infrastructure::persistence::{schema, SqliteStore};
use taskdeck::presentation::http::{self, AppState};

/// Fresh application state over an in-memory database.
pub async fn test_state() -> AppState {
    let pool = schema::initialize_database("sqlite::memory:")
        .await
        .expect("in-memory database");
    AppState::build(SqliteStore::new(pool), &ServiceConfig::default()).expect("state")
}

/// State plus its router, for HTTP-level tests.
pub async fn test_app() -> (AppState, Router) {
    let state = test_state().await;
    let app = http::router(state.clone());
    (state, app)
}

/// Submits a draft described as JSON, panicking on malformed test input.
pub async fn submit_json(state: &AppState, body: Value) -> SubmittedDraft {
    let request: SubmitDraft = serde_json::from_value(body).expect("valid submit body");
    state.drafts.submit(request).await.expect("draft submission")
}

/// Drives one request through the router and decodes the JSON body.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(value) => builder.body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}
