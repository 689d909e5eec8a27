//! Response envelope construction.
//!
//! Every JSON body carries a fresh 32-hex transaction id (or query id on
//! the query route), and every response carries the vendor's header set:
//! `Connection: keep-alive`, a `Server` token, an RFC-1123 `Date`, and a
//! `Content-Length` that exactly matches the compactly-serialized body.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Map, Value};

use mirage_core::{new_hex_id, rfc_1123_date, ResultCode};

/// `Server` header token presented by the fake service.
const SERVER_TOKEN: &str = "nginx";

/// A response body under construction, rendered through [`IntoResponse`].
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Map<String, Value>,
    id_field: &'static str,
}

impl ApiResponse {
    /// A response whose body is `{<id>, result_code}`, the shape shared by
    /// every failure and several success routes.
    pub fn code(status: StatusCode, code: ResultCode) -> Self {
        let mut body = Map::new();
        body.insert("result_code".to_owned(), Value::String(code.as_str().to_owned()));
        Self {
            status,
            body,
            id_field: "transaction_id",
        }
    }

    /// The query route carries `query_id` instead of `transaction_id`.
    pub fn query(status: StatusCode, code: ResultCode) -> Self {
        let mut response = Self::code(status, code);
        response.id_field = "query_id";
        response
    }

    /// Re-key the body id as `query_id`, for pipeline failures surfaced on
    /// the query route.
    pub fn into_query(mut self) -> Self {
        self.id_field = "query_id";
        self
    }

    /// Attach an extra body field.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.body.insert(key.to_owned(), value);
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(mut self) -> Response {
        self.body
            .insert(self.id_field.to_owned(), Value::String(new_hex_id()));

        // Compact serialization keeps Content-Length in byte-exact
        // agreement with the body.
        let body = Value::Object(self.body).to_string();
        let content_length = body.len();

        let mut response = Response::new(body.into());
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::SERVER, HeaderValue::from_static(SERVER_TOKEN));
        if let Ok(date) = HeaderValue::from_str(&rfc_1123_date(Utc::now())) {
            headers.insert(header::DATE, date);
        }
        if let Ok(length) = HeaderValue::from_str(&content_length.to_string()) {
            headers.insert(header::CONTENT_LENGTH, length);
        }
        response
    }
}
