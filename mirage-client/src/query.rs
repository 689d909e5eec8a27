//! The Query API client.

use chrono::Utc;
use reqwest::{header, Method, StatusCode, Url};
use serde_json::Value;

use mirage_core::{authorization_header, rfc_1123_date};

use crate::error::{ClientError, ErrorResponse};
use crate::reports::QueryResult;

// Fixed so the signed body bytes are reproducible.
const BOUNDARY: &str = "mirageformboundary9e54d1c8a7b2";

/// How much target data a query response should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeTargetData {
    /// Only the best match carries `target_data`. The service default.
    Top,
    None,
    All,
}

impl IncludeTargetData {
    fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::None => "none",
            Self::All => "all",
        }
    }
}

fn text_field(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn multipart_body(
    image: &[u8],
    max_num_results: Option<u8>,
    include_target_data: Option<IncludeTargetData>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"image\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(image);
    body.extend_from_slice(b"\r\n");
    if let Some(max) = max_num_results {
        text_field(&mut body, "max_num_results", &max.to_string());
    }
    if let Some(include) = include_target_data {
        text_field(&mut body, "include_target_data", include.as_str());
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A Query API client bound to one database's client key pair.
#[derive(Debug, Clone)]
pub struct CloudRecoClient {
    client: reqwest::Client,
    base_url: Url,
    access_key: String,
    secret_key: String,
}

impl CloudRecoClient {
    pub fn new(
        base_url: &str,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        })
    }

    /// Submit an image for recognition, returning matched targets in
    /// service order.
    pub async fn query(
        &self,
        image: &[u8],
        max_num_results: Option<u8>,
        include_target_data: Option<IncludeTargetData>,
    ) -> Result<Vec<QueryResult>, ClientError> {
        let body = multipart_body(image, max_num_results, include_target_data);
        let date = rfc_1123_date(Utc::now());
        // The signature covers the bare media type; the boundary parameter
        // only appears in the transmitted header.
        let auth = authorization_header(
            &self.access_key,
            &self.secret_key,
            Method::POST.as_str(),
            &body,
            "multipart/form-data",
            &date,
            "/v1/query",
        );
        let url = self.base_url.join("/v1/query")?;

        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, auth)
            .header(header::DATE, date)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<Value>().await?;
        if status != StatusCode::OK {
            return Err(ClientError::from_response(status, body));
        }
        serde_json::from_value(body["results"].clone()).map_err(|_| {
            ClientError::UnexpectedResponse(ErrorResponse { status, body })
        })
    }
}
