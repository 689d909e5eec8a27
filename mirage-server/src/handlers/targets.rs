//! Target CRUD and duplicate-detection handlers.

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Value};

use mirage_core::{NewTarget, ResultCode, TargetUpdate};

use crate::dispatch::prepare_target_request;
use crate::envelope::ApiResponse;
use crate::state::AppState;
use crate::validators::RouteSpec;

use super::store_error_response;

fn fail() -> Response {
    ApiResponse::code(StatusCode::BAD_REQUEST, ResultCode::Fail).into_response()
}

pub async fn add_target(State(state): State<AppState>, request: Request) -> Response {
    let prepared =
        match prepare_target_request(&state, request, &RouteSpec::ADD_TARGET, None).await {
            Ok(prepared) => prepared,
            Err(response) => return response,
        };

    // The pipeline vouched for the shape of every field below.
    let Some(body) = prepared.json.as_ref().and_then(Value::as_object) else {
        return fail();
    };
    let (Some(name), Some(width), Some(image)) = (
        body.get("name").and_then(Value::as_str),
        body.get("width").and_then(Value::as_f64),
        body.get("image").and_then(Value::as_str).and_then(|encoded| BASE64.decode(encoded).ok()),
    ) else {
        return fail();
    };

    let mut new_target = NewTarget::new(name, width, image);
    if let Some(flag) = body.get("active_flag").and_then(Value::as_bool) {
        new_target.active_flag = flag;
    }
    if let Some(metadata) = body.get("application_metadata").and_then(Value::as_str) {
        new_target.application_metadata = Some(metadata.to_owned());
    }

    let result = prepared.database.write().add_target(new_target, prepared.now);
    match result {
        Ok(target_id) => ApiResponse::code(StatusCode::CREATED, ResultCode::TargetCreated)
            .with("target_id", Value::String(target_id))
            .into_response(),
        Err(error) => store_error_response(error),
    }
}

pub async fn get_target(
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

    let record = json!({
        "target_id": target.target_id(),
        "active_flag": target.active_flag,
        "name": target.name,
        "width": target.width,
        "tracking_rating": target.tracking_rating_at(prepared.now),
        "reco_rating": "",
    });
    ApiResponse::code(StatusCode::OK, ResultCode::Success)
        .with("target_record", record)
        .with("status", json!(target.status_at(prepared.now)))
        .into_response()
}

pub async fn list_targets(State(state): State<AppState>, request: Request) -> Response {
    let prepared =
        match prepare_target_request(&state, request, &RouteSpec::body_free(), None).await {
            Ok(prepared) => prepared,
            Err(response) => return response,
        };

    let ids = prepared.database.read().target_ids();
    ApiResponse::code(StatusCode::OK, ResultCode::Success)
        .with("results", json!(ids))
        .into_response()
}

/// Build a [`TargetUpdate`] from an already-validated body. Null values
/// are rejected here rather than in the pipeline: on creation a null
/// `active_flag` means "use the default", but an update has no default to
/// fall back to.
fn update_from_body(body: &Map<String, Value>) -> Option<TargetUpdate> {
    let mut update = TargetUpdate::default();
    if let Some(value) = body.get("name") {
        update.name = Some(value.as_str()?.to_owned());
    }
    if let Some(value) = body.get("width") {
        update.width = Some(value.as_f64()?);
    }
    if let Some(value) = body.get("active_flag") {
        update.active_flag = Some(value.as_bool()?);
    }
    if let Some(value) = body.get("application_metadata") {
        update.application_metadata = Some(value.as_str()?.to_owned());
    }
    if let Some(value) = body.get("image") {
        update.image = Some(BASE64.decode(value.as_str()?).ok()?);
    }
    Some(update)
}

pub async fn update_target(
    State(state): State<AppState>,
    Path(target_id): Path<String>,
    request: Request,
) -> Response {
    let prepared = match prepare_target_request(
        &state,
        request,
        &RouteSpec::UPDATE_TARGET,
        Some(&target_id),
    )
    .await
    {
        Ok(prepared) => prepared,
        Err(response) => return response,
    };

    let empty = Map::new();
    let body = prepared
        .json
        .as_ref()
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let Some(update) = update_from_body(body) else {
        return fail();
    };

    let result = prepared
        .database
        .write()
        .update_target(&target_id, update, prepared.now);
    match result {
        Ok(()) => ApiResponse::code(StatusCode::OK, ResultCode::Success).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub async fn delete_target(
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

    let result = prepared
        .database
        .write()
        .delete_target(&target_id, prepared.now);
    match result {
        Ok(()) => ApiResponse::code(StatusCode::OK, ResultCode::Success).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub async fn duplicates(
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

    let result = prepared.database.read().duplicates(&target_id, prepared.now);
    match result {
        Ok(ids) => ApiResponse::code(StatusCode::OK, ResultCode::Success)
            .with("similar_targets", json!(ids))
            .into_response(),
        Err(error) => store_error_response(error),
    }
}
