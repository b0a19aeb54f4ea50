// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-to-HTTP error mapping and the envelope response.
//!
//! Handlers never transform transient errors into validation errors: the
//! mapping here is total and static. Every non-2xx response carries the
//! standard envelope with a fresh request id.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use vg_wire::{ErrorCode, ErrorEnvelope};

use crate::engine::EngineError;

/// An API-visible failure, ready to render as the envelope.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: Vec::new() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, what)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "missing or invalid credentials")
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::InvalidAgentId(_) => ErrorCode::ValidationError,

            EngineError::AgentNotFound(_)
            | EngineError::AgentDeregistered(_)
            | EngineError::ScanNotFound(_)
            | EngineError::JobNotFound(_) => ErrorCode::NotFound,

            EngineError::WrongAgent(_) => ErrorCode::Forbidden,

            EngineError::AlreadyFinalized { .. }
            | EngineError::JobNotActive { .. }
            | EngineError::ScanAlreadyTerminal(_)
            | EngineError::CompletionWithoutResults => ErrorCode::Conflict,

            EngineError::UnknownTargetAgent(_)
            | EngineError::TargetNotAuthorized(_)
            | EngineError::TargetDeregistered(_)
            | EngineError::DuplicateTargetAgent(_)
            | EngineError::Validation(_)
            | EngineError::Config(_)
            | EngineError::Batch(_) => ErrorCode::ValidationError,

            EngineError::Storage(_) => ErrorCode::ServiceUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequest, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(%request_id, code = %self.code, message = %self.message, "request failed");
        } else {
            tracing::debug!(%request_id, code = %self.code, message = %self.message, "request rejected");
        }
        let envelope = ErrorEnvelope::new(self.code, self.message, request_id)
            .with_details(self.details);
        let mut response = (status, Json(envelope)).into_response();
        if self.code == ErrorCode::ServiceUnavailable {
            if let Ok(value) = header::HeaderValue::from_str("5") {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
