// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three HTTP surfaces.
//!
//! Scanner (upstream manager), admin (privileged operators), and agent
//! (the polling fleet) are separate trust domains sharing one listener:
//! each router carries its own auth extractor, and a credential from one
//! surface never opens another.

mod admin;
mod agent;
mod error;
mod health;
mod scanner;

pub use error::ApiError;
pub use health::Health;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use vg_core::{AgentId, Clock};
use vg_wire::ErrorCode;

use crate::auth::{bearer, AuthKeys};
use crate::config::LimitsConfig;
use crate::engine::Engine;

/// Shared state behind every handler.
pub struct AppState<C: Clock> {
    pub engine: Engine<C>,
    pub auth: Arc<AuthKeys>,
    pub health: Arc<Health>,
}

impl<C: Clock> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            auth: Arc::clone(&self.auth),
            health: Arc::clone(&self.health),
        }
    }
}

impl<C: Clock> FromRef<AppState<C>> for Arc<AuthKeys> {
    fn from_ref(state: &AppState<C>) -> Self {
        Arc::clone(&state.auth)
    }
}

impl<C: Clock> FromRef<AppState<C>> for Arc<Health> {
    fn from_ref(state: &AppState<C>) -> Self {
        Arc::clone(&state.health)
    }
}

/// JSON body with envelope-shaped rejections.
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string with envelope-shaped rejections.
#[derive(axum::extract::FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The `X-Agent-ID` header, parsed and validated.
pub struct AgentIdHeader(pub AgentId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AgentIdHeader {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-agent-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                ApiError::new(ErrorCode::InvalidRequest, "missing X-Agent-ID header")
            })?;
        let agent_id = AgentId::parse(raw)
            .map_err(|err| ApiError::new(ErrorCode::ValidationError, err.to_string()))?;
        Ok(AgentIdHeader(agent_id))
    }
}

/// Admin-surface credential (`X-API-Key`).
pub struct AdminAuth;

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<AuthKeys>::from_ref(state);
        let key = parts.headers.get("x-api-key").and_then(|value| value.to_str().ok());
        if keys.verify_admin(key) {
            Ok(AdminAuth)
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// Agent-surface credential (bearer token).
pub struct AgentAuth;

#[axum::async_trait]
impl<S> FromRequestParts<S> for AgentAuth
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<AuthKeys>::from_ref(state);
        let header =
            parts.headers.get("authorization").and_then(|value| value.to_str().ok());
        if keys.verify_agent(bearer(header)) {
            Ok(AgentAuth)
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// Scanner-surface credential (optional bearer token).
pub struct ScannerAuth;

#[axum::async_trait]
impl<S> FromRequestParts<S> for ScannerAuth
where
    Arc<AuthKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<AuthKeys>::from_ref(state);
        let header =
            parts.headers.get("authorization").and_then(|value| value.to_str().ok());
        if keys.verify_scanner(bearer(header)) {
            Ok(ScannerAuth)
        } else {
            Err(ApiError::unauthorized())
        }
    }
}

/// Assemble the full application router.
pub fn app<C: Clock>(state: AppState<C>, limits: &LimitsConfig) -> Router {
    Router::new()
        .merge(scanner::router())
        .merge(health::router())
        .nest("/api/v1/admin", admin::router())
        .nest("/api/v1/agents", agent::router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(limits.request_timeout_seconds)))
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
