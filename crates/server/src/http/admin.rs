// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin surface: agent authorization, bulk operations, global config.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use vg_core::Clock;
use vg_wire::{
    AgentPage, AgentQuery, BulkDeleteRequest, BulkPatchRequest, BulkPatchResponse,
    ConfigGetResponse, PutConfigResponse,
};

use super::{AdminAuth, ApiError, ApiJson, ApiQuery, AppState};

pub(super) fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new()
        .route("/agents", get(list_agents).patch(bulk_patch))
        .route("/agents/delete", post(bulk_delete))
        .route("/scan-agent-config", get(get_config).put(put_config))
}

async fn list_agents<C: Clock>(
    _auth: AdminAuth,
    State(state): State<AppState<C>>,
    ApiQuery(query): ApiQuery<AgentQuery>,
) -> Json<AgentPage> {
    Json(state.engine.list_agents(&query))
}

async fn bulk_patch<C: Clock>(
    _auth: AdminAuth,
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<BulkPatchRequest>,
) -> Result<Json<BulkPatchResponse>, ApiError> {
    let results = state.engine.bulk_patch(&request.agent_ids, &request.patch)?;
    Ok(Json(BulkPatchResponse { results }))
}

async fn bulk_delete<C: Clock>(
    _auth: AdminAuth,
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Result<Json<BulkPatchResponse>, ApiError> {
    let results = state.engine.bulk_delete(&request.agent_ids)?;
    Ok(Json(BulkPatchResponse { results }))
}

async fn get_config<C: Clock>(
    _auth: AdminAuth,
    State(state): State<AppState<C>>,
) -> Json<ConfigGetResponse> {
    Json(state.engine.get_config())
}

async fn put_config<C: Clock>(
    _auth: AdminAuth,
    State(state): State<AppState<C>>,
    ApiJson(document): ApiJson<vg_core::ConfigDocument>,
) -> Result<Json<PutConfigResponse>, ApiError> {
    Ok(Json(state.engine.put_config(document)?))
}
