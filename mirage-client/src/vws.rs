//! The Target API client.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::{header, Method, StatusCode, Url};
use serde_json::{json, Value};

use mirage_core::{authorization_header, rfc_1123_date, TargetStatus};

use crate::error::{ClientError, ErrorResponse};
use crate::reports::{DatabaseSummaryReport, TargetStatusAndRecord, TargetSummaryReport};

/// Partial-update fields for [`Vws::update_target`]. `None` fields are
/// left out of the request entirely.
#[derive(Debug, Clone, Default)]
pub struct UpdateTarget {
    pub name: Option<String>,
    pub width: Option<f64>,
    /// Raw image bytes; encoded before sending.
    pub image: Option<Vec<u8>>,
    pub active_flag: Option<bool>,
    /// Base64-encoded metadata, as the service stores it.
    pub application_metadata: Option<String>,
}

impl UpdateTarget {
    fn to_body(&self) -> Value {
        let mut body = json!({});
        if let Some(name) = &self.name {
            body["name"] = json!(name);
        }
        if let Some(width) = self.width {
            body["width"] = json!(width);
        }
        if let Some(image) = &self.image {
            body["image"] = json!(BASE64.encode(image));
        }
        if let Some(flag) = self.active_flag {
            body["active_flag"] = json!(flag);
        }
        if let Some(metadata) = &self.application_metadata {
            body["application_metadata"] = json!(metadata);
        }
        body
    }
}

/// A Target API client bound to one database's server key pair. Every
/// request is signed and carries the RFC-1123 `Date` header the service
/// verifies.
#[derive(Debug, Clone)]
pub struct Vws {
    client: reqwest::Client,
    base_url: Url,
    access_key: String,
    secret_key: String,
}

impl Vws {
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

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ClientError> {
        let (bytes, content_type) = match body {
            Some(value) => (value.to_string().into_bytes(), "application/json"),
            None => (Vec::new(), ""),
        };
        let date = rfc_1123_date(Utc::now());
        let auth = authorization_header(
            &self.access_key,
            &self.secret_key,
            method.as_str(),
            &bytes,
            content_type,
            &date,
            path,
        );
        let url = self.base_url.join(path)?;
        let mut request = self
            .client
            .request(method, url)
            .header(header::AUTHORIZATION, auth)
            .header(header::DATE, date);
        if !content_type.is_empty() {
            request = request.header(header::CONTENT_TYPE, content_type).body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await?;
        Ok((status, body))
    }

    async fn expect(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Result<Value, ClientError> {
        let (status, body) = self.request(method, path, body).await?;
        if status == expected {
            Ok(body)
        } else {
            Err(ClientError::from_response(status, body))
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ClientError> {
        serde_json::from_value(body.clone()).map_err(|_| {
            ClientError::UnexpectedResponse(ErrorResponse {
                status: StatusCode::OK,
                body,
            })
        })
    }

    /// Add a target, returning its id. `application_metadata` is the
    /// base64 form the service stores.
    pub async fn add_target(
        &self,
        name: &str,
        width: f64,
        image: &[u8],
        active_flag: Option<bool>,
        application_metadata: Option<&str>,
    ) -> Result<String, ClientError> {
        let mut body = json!({
            "name": name,
            "width": width,
            "image": BASE64.encode(image),
        });
        if let Some(flag) = active_flag {
            body["active_flag"] = json!(flag);
        }
        if let Some(metadata) = application_metadata {
            body["application_metadata"] = json!(metadata);
        }

        let response = self
            .expect(Method::POST, "/targets", Some(body), StatusCode::CREATED)
            .await?;
        match response.get("target_id").and_then(Value::as_str) {
            Some(target_id) => Ok(target_id.to_owned()),
            None => Err(ClientError::UnexpectedResponse(ErrorResponse {
                status: StatusCode::CREATED,
                body: response,
            })),
        }
    }

    pub async fn get_target_record(
        &self,
        target_id: &str,
    ) -> Result<TargetStatusAndRecord, ClientError> {
        let body = self
            .expect(Method::GET, &format!("/targets/{target_id}"), None, StatusCode::OK)
            .await?;
        Self::parse(body)
    }

    pub async fn list_targets(&self) -> Result<Vec<String>, ClientError> {
        let body = self
            .expect(Method::GET, "/targets", None, StatusCode::OK)
            .await?;
        Self::parse(body["results"].clone())
    }

    pub async fn update_target(
        &self,
        target_id: &str,
        update: &UpdateTarget,
    ) -> Result<(), ClientError> {
        self.expect(
            Method::PUT,
            &format!("/targets/{target_id}"),
            Some(update.to_body()),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    pub async fn delete_target(&self, target_id: &str) -> Result<(), ClientError> {
        self.expect(
            Method::DELETE,
            &format!("/targets/{target_id}"),
            None,
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    pub async fn get_database_summary_report(
        &self,
    ) -> Result<DatabaseSummaryReport, ClientError> {
        let body = self
            .expect(Method::GET, "/summary", None, StatusCode::OK)
            .await?;
        Self::parse(body)
    }

    pub async fn get_target_summary_report(
        &self,
        target_id: &str,
    ) -> Result<TargetSummaryReport, ClientError> {
        let body = self
            .expect(Method::GET, &format!("/summary/{target_id}"), None, StatusCode::OK)
            .await?;
        Self::parse(body)
    }

    pub async fn get_duplicate_targets(
        &self,
        target_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        let body = self
            .expect(Method::GET, &format!("/duplicates/{target_id}"), None, StatusCode::OK)
            .await?;
        Self::parse(body["similar_targets"].clone())
    }

    /// Poll until the target leaves the processing state, re-fetching
    /// every `poll_interval`. With a `timeout`, gives up once the next
    /// poll would overrun it.
    pub async fn wait_for_target_processed(
        &self,
        target_id: &str,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<TargetStatusAndRecord, ClientError> {
        let started = Instant::now();
        loop {
            let record = self.get_target_record(target_id).await?;
            if record.status != TargetStatus::Processing {
                return Ok(record);
            }
            if let Some(timeout) = timeout {
                if started.elapsed() + poll_interval > timeout {
                    return Err(ClientError::ProcessingTimeout(timeout));
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
