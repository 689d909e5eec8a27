//! Image-recognition query handler.
//!
//! The query route authenticates with the client key pair, tolerates far
//! more clock drift than the Target API, and takes a multipart body
//! instead of JSON. Matching reuses the database's content-equivalence
//! rule: a query "recognizes" every active, successfully processed target
//! whose stored image has the same content digest as the submitted one.

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{json, Value};

use mirage_core::{access_key_from_header, AnalyzedImage, ResultCode, Target};

use crate::envelope::ApiResponse;
use crate::state::AppState;
use crate::validators::{run_pipeline, RequestContext, RouteSpec, QUERY_PIPELINE};

fn query_fail() -> Response {
    ApiResponse::code(StatusCode::BAD_REQUEST, ResultCode::Fail)
        .into_query()
        .into_response()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum IncludeTargetData {
    Top,
    None,
    All,
}

/// Parsed multipart form fields.
struct QueryForm {
    image: Vec<u8>,
    max_num_results: usize,
    include_target_data: IncludeTargetData,
}

async fn parse_form(mut multipart: Multipart) -> Option<QueryForm> {
    let mut image = None;
    let mut max_num_results = 1usize;
    let mut include_target_data = IncludeTargetData::Top;

    while let Some(field) = multipart.next_field().await.ok()? {
        match field.name() {
            Some("image") => image = Some(field.bytes().await.ok()?.to_vec()),
            Some("max_num_results") => {
                let requested: i64 = field.text().await.ok()?.parse().ok()?;
                if !(1..=50).contains(&requested) {
                    return None;
                }
                max_num_results = requested as usize;
            }
            Some("include_target_data") => {
                include_target_data = match field.text().await.ok()?.to_lowercase().as_str() {
                    "top" => IncludeTargetData::Top,
                    "none" => IncludeTargetData::None,
                    "all" => IncludeTargetData::All,
                    _ => return None,
                };
            }
            _ => return None,
        }
    }

    Some(QueryForm {
        image: image?,
        max_num_results,
        include_target_data,
    })
}

fn result_entry(target: &Target, with_data: bool) -> Value {
    let mut entry = json!({ "target_id": target.target_id() });
    if with_data {
        entry["target_data"] = json!({
            "name": target.name,
            "application_metadata": target.application_metadata,
            "target_timestamp": target.last_modified().timestamp(),
        });
    }
    entry
}

pub async fn query(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(body) = axum::body::to_bytes(body, state.config().body_limit_bytes()).await else {
        return query_fail();
    };

    let Some(auth) = parts.headers.get(header::AUTHORIZATION) else {
        return ApiResponse::code(StatusCode::UNAUTHORIZED, ResultCode::AuthenticationFailure)
            .into_query()
            .into_response();
    };
    let Some(access_key) = auth.to_str().ok().and_then(access_key_from_header) else {
        return query_fail();
    };
    let Some(database) = state.database_by_client_key(access_key) else {
        return query_fail();
    };
    let (access_key, secret_key) = {
        let guard = database.read();
        (
            guard.client_access_key.clone(),
            guard.client_secret_key.clone(),
        )
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    // The signature covers the bare media type, not the boundary
    // parameter the HTTP client appended.
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    let now = Utc::now();

    let ctx = RequestContext {
        method: &parts.method,
        path: parts.uri.path(),
        headers: &parts.headers,
        body: &body,
        json: None,
        signature_content_type: media_type,
        access_key: &access_key,
        secret_key: &secret_key,
        now,
        skew_tolerance: state.config().query_skew_tolerance(),
    };
    if let Some(response) = run_pipeline(QUERY_PIPELINE, &ctx, &RouteSpec::body_free()) {
        return response.into_query().into_response();
    }

    let request = Request::from_parts(parts, Body::from(body));
    let Ok(multipart) = Multipart::from_request(request, &()).await else {
        return query_fail();
    };
    let Some(form) = parse_form(multipart).await else {
        return query_fail();
    };

    if AnalyzedImage::decode(&form.image).is_err() {
        return ApiResponse::code(StatusCode::UNPROCESSABLE_ENTITY, ResultCode::BadImage)
            .into_query()
            .into_response();
    }

    let guard = database.read();
    let results: Vec<Value> = guard
        .matching_targets(&form.image, now)
        .into_iter()
        .take(form.max_num_results)
        .enumerate()
        .map(|(index, target)| {
            let with_data = match form.include_target_data {
                IncludeTargetData::All => true,
                IncludeTargetData::Top => index == 0,
                IncludeTargetData::None => false,
            };
            result_entry(target, with_data)
        })
        .collect();

    ApiResponse::query(StatusCode::OK, ResultCode::Success)
        .with("results", Value::Array(results))
        .into_response()
}
