// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probes: `/health/{alive|ready|started}`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use vg_core::Clock;
use vg_wire::ErrorCode;

use super::{ApiError, AppState};

/// Probe state flipped during startup/shutdown.
#[derive(Default)]
pub struct Health {
    started: AtomicBool,
    ready: AtomicBool,
}

impl Health {
    pub fn set_started(&self) {
        self.started.store(true, Ordering::Release);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

pub(super) fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new().route("/health/:probe", get(probe))
}

#[derive(Serialize)]
struct ProbeResponse {
    status: &'static str,
}

async fn probe<C: Clock>(
    State(state): State<AppState<C>>,
    Path(probe): Path<String>,
) -> Result<Response, ApiError> {
    let health: &Arc<Health> = &state.health;
    let up = match probe.as_str() {
        "alive" => true,
        "ready" => health.is_ready(),
        "started" => health.is_started(),
        _ => return Err(ApiError::new(ErrorCode::NotFound, "unknown health probe")),
    };
    let response = if up {
        (StatusCode::OK, Json(ProbeResponse { status: "ok" })).into_response()
    } else {
        let mut response = (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeResponse { status: "unavailable" }),
        )
            .into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str("5") {
            response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
        }
        response
    };
    Ok(response)
}
