//! Database and per-target summary reports.

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mirage_core::ResultCode;

use crate::dispatch::prepare_target_request;
use crate::envelope::ApiResponse;
use crate::state::AppState;
use crate::validators::RouteSpec;

// The mock does not meter real quotas; the summary reports the
// free-plan limits with zero recognition usage.
const TARGET_QUOTA: u64 = 1000;
const REQUEST_QUOTA: u64 = 100_000;
const RECO_THRESHOLD: u64 = 1000;

pub async fn database_summary(State(state): State<AppState>, request: Request) -> Response {
    let prepared = match prepare_target_request(
        &state,
        request,
        &RouteSpec::summary_root(),
        None,
    )
    .await
    {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let guard = prepared.database.read();
    let counts = guard.status_counts(prepared.now);
    ApiResponse::code(StatusCode::OK, ResultCode::Success)
        .with("name", json!(guard.name))
        .with("active_images", json!(counts.active))
        .with("inactive_images", json!(counts.inactive))
        .with("failed_images", json!(counts.failed))
        .with("processing_images", json!(counts.processing))
        .with("target_quota", json!(TARGET_QUOTA))
        .with("request_quota", json!(REQUEST_QUOTA))
        .with("request_usage", json!(guard.request_usage()))
        .with("reco_threshold", json!(RECO_THRESHOLD))
        .with("total_recos", json!(0))
        .with("current_month_recos", json!(0))
        .with("previous_month_recos", json!(0))
        .into_response()
}

pub async fn target_summary(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    request: Request,
) -> Response {
    let prepared = match prepare_target_request(
        &state,
        request,
        &RouteSpec::body_free(),
        Some(&target_id),
    )
    .await
    {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let guard = prepared.database.read();
    let Some(target) = guard.target(&target_id) else {
        return ApiResponse::code(StatusCode::NOT_FOUND, ResultCode::UnknownTarget)
            .into_response();
    };

    ApiResponse::code(StatusCode::OK, ResultCode::Success)
        .with("status", json!(target.status_at(prepared.now)))
        .with("database_name", json!(guard.name))
        .with("target_name", json!(target.name))
        .with("upload_date", json!(target.upload_date().format("%Y-%m-%d").to_string()))
        .with("active_flag", json!(target.active_flag))
        .with("tracking_rating", json!(target.tracking_rating_at(prepared.now)))
        .with("total_recos", json!(0))
        .with("current_month_recos", json!(0))
        .with("previous_month_recos", json!(0))
        .into_response()
}
