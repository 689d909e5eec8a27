//! The ordered request-validation pipeline.
//!
//! Each validator is a pure function of the request context and the
//! route's declared requirements, returning `None` to let the next stage
//! run or a terminal response. Several checks have overlapping trigger
//! conditions, so the order of [`TARGET_PIPELINE`] is part of the wire
//! contract: the first validator to fire determines the response.

use axum::http::{header, HeaderMap, Method, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use mirage_core::{
    authorization_header, parse_rfc_1123_date, AnalyzedImage, ResultCode, MAX_IMAGE_BYTES,
    MAX_METADATA_BYTES,
};

use crate::envelope::ApiResponse;

/// Everything a validator may inspect about a request.
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
    /// Body parsed as JSON, when it parsed at all.
    pub json: Option<&'a Value>,
    /// Content-type string the signature covers. For the query API this is
    /// the bare media type without the boundary parameter.
    pub signature_content_type: &'a str,
    /// Credentials of the database the request resolved to.
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub now: DateTime<Utc>,
    pub skew_tolerance: Duration,
}

/// Per-route validation requirements.
#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub mandatory_keys: &'static [&'static str],
    pub optional_keys: &'static [&'static str],
    /// The database-summary route answers any body at all with an
    /// authentication failure.
    pub body_is_auth_failure: bool,
}

impl RouteSpec {
    pub const fn body_free() -> Self {
        Self {
            mandatory_keys: &[],
            optional_keys: &[],
            body_is_auth_failure: false,
        }
    }

    pub const fn summary_root() -> Self {
        Self {
            mandatory_keys: &[],
            optional_keys: &[],
            body_is_auth_failure: true,
        }
    }

    pub const ADD_TARGET: Self = Self {
        mandatory_keys: &["image", "name", "width"],
        optional_keys: &["active_flag", "application_metadata"],
        body_is_auth_failure: false,
    };

    pub const UPDATE_TARGET: Self = Self {
        mandatory_keys: &[],
        optional_keys: &["active_flag", "application_metadata", "image", "name", "width"],
        body_is_auth_failure: false,
    };
}

pub type Validator = fn(&RequestContext<'_>, &RouteSpec) -> Option<ApiResponse>;

/// Pipeline for Target API routes, after target-id resolution.
pub const TARGET_PIPELINE: &[Validator] = &[
    auth_header_exists,
    authorization_matches,
    date_is_valid,
    date_is_current,
    body_is_valid_json,
    keys_are_allowed,
    name_is_valid,
    width_is_valid,
    active_flag_is_valid,
    metadata_is_valid,
    image_is_valid,
];

/// Pipeline for the Query API; body checks are multipart-specific and live
/// with the query handler.
pub const QUERY_PIPELINE: &[Validator] = &[
    auth_header_exists,
    authorization_matches,
    date_is_valid,
    date_is_current,
];

/// Run `pipeline` to the first terminal response.
pub fn run_pipeline(
    pipeline: &[Validator],
    ctx: &RequestContext<'_>,
    spec: &RouteSpec,
) -> Option<ApiResponse> {
    for validator in pipeline {
        if let Some(response) = validator(ctx, spec) {
            return Some(response);
        }
    }
    None
}

fn fail() -> ApiResponse {
    ApiResponse::code(StatusCode::BAD_REQUEST, ResultCode::Fail)
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn auth_header_exists(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    if ctx.headers.contains_key(header::AUTHORIZATION) {
        return None;
    }
    tracing::warn!(path = ctx.path, "request without authorization header");
    Some(ApiResponse::code(
        StatusCode::UNAUTHORIZED,
        ResultCode::AuthenticationFailure,
    ))
}

fn authorization_matches(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let supplied = header_str(ctx.headers, header::AUTHORIZATION)?;
    let date = header_str(ctx.headers, header::DATE).unwrap_or("");
    let expected = authorization_header(
        ctx.access_key,
        ctx.secret_key,
        ctx.method.as_str(),
        ctx.body,
        ctx.signature_content_type,
        date,
        ctx.path,
    );
    if supplied == expected {
        return None;
    }
    tracing::warn!(path = ctx.path, "request signature mismatch");
    Some(fail())
}

fn date_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    match header_str(ctx.headers, header::DATE) {
        Some(date) if parse_rfc_1123_date(date).is_some() => None,
        _ => Some(fail()),
    }
}

fn date_is_current(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let date = header_str(ctx.headers, header::DATE).and_then(parse_rfc_1123_date)?;
    let skew = (ctx.now - date).abs();
    if skew < ctx.skew_tolerance {
        return None;
    }
    tracing::warn!(path = ctx.path, skew_seconds = skew.num_seconds(), "request time too skewed");
    Some(ApiResponse::code(
        StatusCode::FORBIDDEN,
        ResultCode::RequestTimeTooSkewed,
    ))
}

fn body_is_valid_json(ctx: &RequestContext<'_>, spec: &RouteSpec) -> Option<ApiResponse> {
    if ctx.body.is_empty() {
        return None;
    }
    if spec.body_is_auth_failure {
        return Some(ApiResponse::code(
            StatusCode::UNAUTHORIZED,
            ResultCode::AuthenticationFailure,
        ));
    }
    if ctx.json.is_none() {
        return Some(fail());
    }
    None
}

fn keys_are_allowed(ctx: &RequestContext<'_>, spec: &RouteSpec) -> Option<ApiResponse> {
    if ctx.body.is_empty() && spec.mandatory_keys.is_empty() && spec.optional_keys.is_empty() {
        return None;
    }

    let given = match ctx.json {
        None => Vec::new(),
        Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
        // A body that parses to a non-object can never satisfy a key set.
        Some(_) => return Some(fail()),
    };

    let all_allowed = given.iter().all(|key| {
        spec.mandatory_keys.contains(key) || spec.optional_keys.contains(key)
    });
    let mandatory_given = spec.mandatory_keys.iter().all(|key| given.contains(key));

    if all_allowed && mandatory_given {
        None
    } else {
        Some(fail())
    }
}

fn name_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let name = ctx.json?.as_object()?.get("name")?;
    match name.as_str() {
        Some(name) if (1..=64).contains(&name.chars().count()) => None,
        _ => Some(fail()),
    }
}

fn width_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let width = ctx.json?.as_object()?.get("width")?;
    match width.as_f64() {
        Some(width) if width > 0.0 => None,
        _ => Some(fail()),
    }
}

fn active_flag_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let flag = ctx.json?.as_object()?.get("active_flag")?;
    if flag.is_boolean() || flag.is_null() {
        None
    } else {
        Some(fail())
    }
}

fn metadata_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let metadata = ctx.json?.as_object()?.get("application_metadata")?;
    if metadata.is_null() {
        return None;
    }
    let Some(metadata) = metadata.as_str() else {
        return Some(fail());
    };
    let Ok(decoded) = BASE64.decode(metadata) else {
        return Some(ApiResponse::code(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResultCode::Fail,
        ));
    };
    if decoded.len() > MAX_METADATA_BYTES {
        return Some(ApiResponse::code(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResultCode::MetadataTooLarge,
        ));
    }
    None
}

fn image_is_valid(ctx: &RequestContext<'_>, _spec: &RouteSpec) -> Option<ApiResponse> {
    let image = ctx.json?.as_object()?.get("image")?;
    let Some(image) = image.as_str() else {
        return Some(fail());
    };
    let Ok(decoded) = BASE64.decode(image) else {
        return Some(ApiResponse::code(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResultCode::Fail,
        ));
    };
    let Ok(analyzed) = AnalyzedImage::decode(&decoded) else {
        return Some(bad_image());
    };
    if analyzed.check_format().is_err() || analyzed.check_color_space().is_err() {
        return Some(bad_image());
    }
    if decoded.len() > MAX_IMAGE_BYTES {
        return Some(ApiResponse::code(
            StatusCode::UNPROCESSABLE_ENTITY,
            ResultCode::ImageTooLarge,
        ));
    }
    None
}

fn bad_image() -> ApiResponse {
    ApiResponse::code(StatusCode::UNPROCESSABLE_ENTITY, ResultCode::BadImage)
}
