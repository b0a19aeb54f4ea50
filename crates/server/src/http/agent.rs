// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent surface: heartbeats, job polling, result submission.
//!
//! All agent-bound control piggy-backs on these responses — the controller
//! never pushes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use vg_core::{Clock, JobId};
use vg_wire::{
    CompleteRequest, CompleteResponse, ConfigResponse, HeartbeatRequest, HeartbeatResponse,
    JobsResponse, ResultsAccepted, ResultsSubmission, UpdatesResponse,
};

use super::{AgentAuth, AgentIdHeader, ApiError, ApiJson, AppState};

pub(super) fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new()
        .route("/heartbeat", post(heartbeat))
        .route("/config", get(agent_config))
        .route("/jobs", get(jobs))
        .route("/jobs/:id/results", post(submit_results))
        .route("/jobs/:id/complete", post(complete))
        .route("/updates", get(updates))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    JobId::parse(raw).map_err(|_| ApiError::not_found("unknown job"))
}

async fn heartbeat<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let response = state.engine.heartbeat(
        &request.agent_id,
        request.attrs,
        request.config_version_seen,
    )?;
    Ok(Json(response))
}

async fn agent_config<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    AgentIdHeader(agent_id): AgentIdHeader,
) -> Result<Json<ConfigResponse>, ApiError> {
    Ok(Json(state.engine.agent_config(agent_id)?))
}

async fn jobs<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    AgentIdHeader(agent_id): AgentIdHeader,
) -> Result<Json<JobsResponse>, ApiError> {
    Ok(Json(state.engine.claim_jobs(agent_id)?))
}

async fn submit_results<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    AgentIdHeader(agent_id): AgentIdHeader,
    Path(id): Path<String>,
    ApiJson(submission): ApiJson<ResultsSubmission>,
) -> Result<(StatusCode, Json<ResultsAccepted>), ApiError> {
    let job_id = parse_job_id(&id)?;
    let accepted = state.engine.submit_results(agent_id, job_id, &submission)?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

async fn complete<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    AgentIdHeader(agent_id): AgentIdHeader,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CompleteRequest>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let job_id = parse_job_id(&id)?;
    let response = match request.outcome.as_job_outcome() {
        Some(outcome) => {
            state.engine.finalize_job(agent_id, job_id, outcome, request.summary.as_deref())?
        }
        None => state.engine.extend_lease(agent_id, job_id)?,
    };
    Ok(Json(response))
}

async fn updates<C: Clock>(
    _auth: AgentAuth,
    State(state): State<AppState<C>>,
    AgentIdHeader(agent_id): AgentIdHeader,
) -> Result<Json<UpdatesResponse>, ApiError> {
    Ok(Json(state.engine.agent_updates(agent_id)?))
}
