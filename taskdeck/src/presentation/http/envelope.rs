// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Response Envelope
//!
//! Every API response wraps its payload in `{success, data?, error?}`.
//! Domain errors are classified by `ErrorKind` and mapped to status codes
//! here - nothing below the facade knows about HTTP. Internal errors are
//! logged with detail but cross the wire with their message intact and
//! nothing more.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use taskdeck_domain::{CoreError, ErrorKind};

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

/// Error body inside the envelope.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = Result<Json<ApiEnvelope<T>>, ApiFailure>;

/// Wraps a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiEnvelope {
        success: true,
        data,
    }))
}

/// A domain error on its way out of the facade.
#[derive(Debug)]
pub struct ApiFailure(pub CoreError);

impl From<CoreError> for ApiFailure {
    fn from(error: CoreError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if kind == ErrorKind::Internal {
            error!(error = %self.0, "Request failed internally");
        }
        let body = serde_json::json!({
            "success": false,
            "error": ApiErrorBody {
                code: kind.code(),
                message: self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// `Json` with the rejection rewritten into the envelope, so malformed
/// bodies surface as `VALIDATION` rather than axum's plain-text default.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ApiFailure(CoreError::validation(format!(
                "invalid request body: {}",
                rejection.body_text()
            )))),
        }
    }
}
