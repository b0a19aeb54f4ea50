// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner surface: scan lifecycle for the upstream manager.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use vg_core::{Clock, ScanId};
use vg_wire::{
    CreateScanRequest, CreateScanResponse, ErrorCode, PreferencesResponse, ResultsPage,
    ScanActionRequest, ScanStatusResponse,
};

use super::{ApiError, ApiJson, ApiQuery, AppState, ScannerAuth};

pub(super) fn router<C: Clock>() -> Router<AppState<C>> {
    Router::new()
        .route("/scans", post(create_scan))
        .route("/scans/preferences", get(preferences))
        .route("/scans/:id", post(scan_action).delete(delete_scan))
        .route("/scans/:id/status", get(scan_status))
        .route("/scans/:id/results", get(scan_results))
}

fn parse_scan_id(raw: &str) -> Result<ScanId, ApiError> {
    ScanId::parse(raw).map_err(|_| ApiError::not_found("unknown scan"))
}

async fn create_scan<C: Clock>(
    _auth: ScannerAuth,
    State(state): State<AppState<C>>,
    ApiJson(request): ApiJson<CreateScanRequest>,
) -> Result<(StatusCode, Json<CreateScanResponse>), ApiError> {
    let response = state.engine.create_scan(&request)?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn scan_action<C: Clock>(
    _auth: ScannerAuth,
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ScanActionRequest>,
) -> Result<Json<ScanStatusResponse>, ApiError> {
    let scan_id = parse_scan_id(&id)?;
    Ok(Json(state.engine.scan_action(scan_id, request.action)?))
}

async fn scan_status<C: Clock>(
    _auth: ScannerAuth,
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<ScanStatusResponse>, ApiError> {
    let scan_id = parse_scan_id(&id)?;
    Ok(Json(state.engine.scan_status(scan_id)?))
}

#[derive(Debug, Default, Deserialize)]
struct ResultsQuery {
    range: Option<String>,
}

/// `range=a-b`, inclusive on both ends.
fn parse_range(raw: &str) -> Result<(usize, usize), ApiError> {
    let invalid =
        || ApiError::new(ErrorCode::InvalidRequest, format!("invalid range: {raw:?}"));
    let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
    let start: usize = start.parse().map_err(|_| invalid())?;
    let end: usize = end.parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok((start, end))
}

async fn scan_results<C: Clock>(
    _auth: ScannerAuth,
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ResultsQuery>,
) -> Result<Json<ResultsPage>, ApiError> {
    let scan_id = parse_scan_id(&id)?;
    let range = query.range.as_deref().map(parse_range).transpose()?;
    Ok(Json(state.engine.scan_results(scan_id, range)?))
}

async fn delete_scan<C: Clock>(
    _auth: ScannerAuth,
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let scan_id = parse_scan_id(&id)?;
    state.engine.delete_scan(scan_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn preferences(_auth: ScannerAuth) -> Json<PreferencesResponse> {
    Json(PreferencesResponse { preferences: vg_core::PREFERENCE_CATALOG })
}
