//! Shared request preparation for the Target API routes.
//!
//! Every Target API handler funnels through [`prepare_target_request`],
//! which resolves the database from the `Authorization` access key, checks
//! target-id existence ahead of the rest of the pipeline, and then runs
//! the ordered validators. Handlers only see requests that survived all
//! of that.

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::Value;

use mirage_core::{access_key_from_header, ResultCode};

use crate::envelope::ApiResponse;
use crate::state::{AppState, SharedDatabase};
use crate::validators::{run_pipeline, RequestContext, RouteSpec, TARGET_PIPELINE};

/// A request that passed the full validation pipeline.
pub struct Prepared {
    pub database: SharedDatabase,
    pub body: Bytes,
    pub json: Option<Value>,
    pub now: DateTime<Utc>,
}

fn fail() -> Response {
    ApiResponse::code(StatusCode::BAD_REQUEST, ResultCode::Fail).into_response()
}

/// Resolve the database a request addresses from its `Authorization`
/// header. A missing header is an authentication failure; a header that is
/// present but malformed or that names no registered database is
/// indistinguishable from a wrong signature and fails the same way.
fn resolve_database(state: &AppState, headers: &axum::http::HeaderMap) -> Result<SharedDatabase, Response> {
    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiResponse::code(
            StatusCode::UNAUTHORIZED,
            ResultCode::AuthenticationFailure,
        )
        .into_response());
    };
    let access_key = auth
        .to_str()
        .ok()
        .and_then(access_key_from_header)
        .ok_or_else(fail)?;
    state.database_by_server_key(access_key).ok_or_else(fail)
}

/// Collect the body and run the Target API pipeline against `spec`.
///
/// When `target_id` is given, its existence is checked before anything
/// else: an unknown id answers 404 regardless of how broken the rest of
/// the request is.
pub async fn prepare_target_request(
    state: &AppState,
    request: Request,
    spec: &RouteSpec,
    target_id: Option<&str>,
) -> Result<Prepared, Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.config().body_limit_bytes())
        .await
        .map_err(|_| fail())?;

    let database = resolve_database(state, &parts.headers)?;
    let (access_key, secret_key) = {
        let guard = database.read();
        if let Some(id) = target_id {
            if guard.target(id).is_none() {
                return Err(ApiResponse::code(
                    StatusCode::NOT_FOUND,
                    ResultCode::UnknownTarget,
                )
                .into_response());
            }
        }
        (
            guard.server_access_key.clone(),
            guard.server_secret_key.clone(),
        )
    };

    let json: Option<Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let now = Utc::now();

    let ctx = RequestContext {
        method: &parts.method,
        path: parts.uri.path(),
        headers: &parts.headers,
        body: &body,
        json: json.as_ref(),
        signature_content_type: content_type,
        access_key: &access_key,
        secret_key: &secret_key,
        now,
        skew_tolerance: state.config().target_skew_tolerance(),
    };
    if let Some(response) = run_pipeline(TARGET_PIPELINE, &ctx, spec) {
        return Err(response.into_response());
    }

    Ok(Prepared {
        database,
        body,
        json,
        now,
    })
}
