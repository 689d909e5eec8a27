//! Error mapping from wire result codes to typed variants.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The raw response an error variant was built from, kept for
/// introspection.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// One variant per documented result code, so callers can match on the
/// failure they care about.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid base url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("authentication failure")]
    AuthenticationFailure(ErrorResponse),
    #[error("request time too skewed")]
    RequestTimeTooSkewed(ErrorResponse),
    #[error("target name already exists")]
    TargetNameExist(ErrorResponse),
    #[error("unknown target")]
    UnknownTarget(ErrorResponse),
    #[error("bad image")]
    BadImage(ErrorResponse),
    #[error("image too large")]
    ImageTooLarge(ErrorResponse),
    #[error("application metadata too large")]
    MetadataTooLarge(ErrorResponse),
    #[error("request failed")]
    Fail(ErrorResponse),
    #[error("target is still processing")]
    TargetStatusProcessing(ErrorResponse),
    #[error("target has not processed successfully")]
    TargetStatusNotSuccess(ErrorResponse),
    #[error("project is inactive")]
    ProjectInactive(ErrorResponse),
    #[error("response did not match any documented shape")]
    UnexpectedResponse(ErrorResponse),
    #[error("target still processing after {0:?}")]
    ProcessingTimeout(std::time::Duration),
}

impl ClientError {
    /// Classify a non-expected response by its `result_code`.
    pub(crate) fn from_response(status: StatusCode, body: Value) -> Self {
        let code = body
            .get("result_code")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let response = ErrorResponse { status, body };
        match code.as_str() {
            "AuthenticationFailure" => Self::AuthenticationFailure(response),
            "RequestTimeTooSkewed" => Self::RequestTimeTooSkewed(response),
            "TargetNameExist" => Self::TargetNameExist(response),
            "UnknownTarget" => Self::UnknownTarget(response),
            "BadImage" => Self::BadImage(response),
            "ImageTooLarge" => Self::ImageTooLarge(response),
            "MetadataTooLarge" => Self::MetadataTooLarge(response),
            "Fail" => Self::Fail(response),
            "TargetStatusProcessing" => Self::TargetStatusProcessing(response),
            "TargetStatusNotSuccess" => Self::TargetStatusNotSuccess(response),
            "ProjectInactive" => Self::ProjectInactive(response),
            _ => Self::UnexpectedResponse(response),
        }
    }
}
