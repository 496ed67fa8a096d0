//! Handlers for load-pallet tracking.
//!
//! Manifest writes, scan progress, deletion, listing with a dashboard
//! summary, and per-pallet detail. Completion notifications are dispatched
//! fire-and-forget after a successful progress update.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fleetflow_core::error::CoreError;
use fleetflow_core::load_pallet::{
    normalize_load_id, override_contradicts_ratio, validate_scanned_count, LoadStatus,
};
use fleetflow_db::models::load_pallet::{
    DeleteLoadPalletParams, LoadPalletAssignment, LoadPalletFilter, LoadPalletListParams,
    ProgressChange, RecordProgress, UpsertLoadPallets,
};
use fleetflow_db::repositories::LoadPalletRepo;
use fleetflow_events::{dispatch_completion, LoadCompletion};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// `{ "assignment": ... }` payload shared by the write endpoints.
#[derive(Debug, Serialize)]
pub struct AssignmentBody {
    pub assignment: LoadPalletAssignment,
}

/// GET /api/v1/load-pallets
///
/// List assignments, optionally filtered by `loadId` and `status`.
pub async fn list_load_pallets(
    State(state): State<AppState>,
    query: Result<Query<LoadPalletListParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;

    let status = params
        .status
        .as_deref()
        .map(str::parse::<LoadStatus>)
        .transpose()?;
    let filter = LoadPalletFilter {
        load_id: params
            .load_id
            .as_deref()
            .map(|id| normalize_load_id(id).to_string()),
        status,
    };

    let listing = LoadPalletRepo::list(&state.pool, &filter).await;

    Ok(Json(DataResponse { data: listing }))
}

/// POST /api/v1/load-pallets
///
/// Create a load's manifest, or replace it if the load already exists.
/// Returns 201 on create and 200 on replace.
pub async fn upsert_load_pallets(
    State(state): State<AppState>,
    body: Result<Json<UpsertLoadPallets>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;

    let outcome = LoadPalletRepo::upsert(&state.pool, &input.load_id, input.pallet_ids).await?;

    tracing::info!(
        load_id = %outcome.assignment.load_id,
        expected = outcome.assignment.expected_count,
        created = outcome.created,
        "Load manifest saved",
    );

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(DataResponse {
            data: AssignmentBody {
                assignment: outcome.assignment,
            },
        }),
    ))
}

/// PUT /api/v1/load-pallets
///
/// Record scan progress and/or an explicit status for a load.
pub async fn record_progress(
    State(state): State<AppState>,
    body: Result<Json<RecordProgress>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body?;
    let change = parse_progress_change(&input)?;

    let update = LoadPalletRepo::record_progress(&state.pool, &input.load_id, change).await?;
    let assignment = &update.assignment;

    if let Some(explicit) = change.status {
        if override_contradicts_ratio(explicit, assignment.scanned_count, assignment.expected_count)
        {
            tracing::warn!(
                load_id = %assignment.load_id,
                status = %explicit,
                scanned = assignment.scanned_count,
                expected = assignment.expected_count,
                "Explicit status contradicts scan ratio",
            );
        }
    }

    tracing::info!(
        load_id = %assignment.load_id,
        scanned = assignment.scanned_count,
        expected = assignment.expected_count,
        from = %update.previous_status,
        to = %assignment.status,
        "Load progress recorded",
    );

    if update.completed_now() {
        dispatch_completion(
            Arc::clone(&state.notifier),
            LoadCompletion::new(
                assignment.load_id.clone(),
                assignment.scanned_count,
                assignment.expected_count,
            ),
        );
    }

    Ok(Json(DataResponse {
        data: AssignmentBody {
            assignment: update.assignment,
        },
    }))
}

/// DELETE /api/v1/load-pallets?loadId=...
///
/// Remove a load. Deleting an unknown load is a 404, including a repeat.
pub async fn delete_load_pallets(
    State(state): State<AppState>,
    query: Result<Query<DeleteLoadPalletParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    let load_id = required_load_id(params.load_id.as_deref())?;

    let assignment = LoadPalletRepo::remove(&state.pool, load_id).await?;

    tracing::info!(load_id, "Load removed");

    Ok(Json(DataResponse {
        data: AssignmentBody { assignment },
    }))
}

/// GET /api/v1/load-pallets/{load_id}/pallets
///
/// One row per manifest entry plus a count reconciliation.
pub async fn get_pallet_detail(
    State(state): State<AppState>,
    Path(load_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let detail = LoadPalletRepo::pallet_detail(&state.pool, &load_id).await?;

    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn required_load_id(load_id: Option<&str>) -> Result<&str, CoreError> {
    match load_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(CoreError::validation("loadId is required")),
    }
}

/// Validate a progress body, reporting every problem at once.
fn parse_progress_change(input: &RecordProgress) -> Result<ProgressChange, CoreError> {
    let mut details = Vec::new();

    if input.load_id.trim().is_empty() {
        details.push("loadId is required".to_string());
    }

    let scanned_count = match input.scanned_count.map(validate_scanned_count).transpose() {
        Ok(count) => count,
        Err(e) => {
            details.extend(validation_details(e));
            None
        }
    };

    let status = match input.status.as_deref().map(str::parse::<LoadStatus>).transpose() {
        Ok(status) => status,
        Err(e) => {
            details.extend(validation_details(e));
            None
        }
    };

    if !details.is_empty() {
        return Err(CoreError::Validation {
            message: details.join("; "),
            details,
        });
    }

    Ok(ProgressChange {
        scanned_count,
        status,
    })
}

fn validation_details(err: CoreError) -> Vec<String> {
    match err {
        CoreError::Validation { details, .. } => details,
        other => vec![other.to_string()],
    }
}
