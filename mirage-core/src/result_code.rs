//! The canonical result-code and target-status vocabularies.
//!
//! Every response body carries a `result_code` string; the exact spellings
//! are part of the wire protocol and are matched verbatim by clients.

use serde::{Deserialize, Serialize};

/// Outcome of a request, paired with an HTTP status by each route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    Success,
    TargetCreated,
    AuthenticationFailure,
    RequestTimeTooSkewed,
    TargetNameExist,
    UnknownTarget,
    BadImage,
    ImageTooLarge,
    MetadataTooLarge,
    DateRangeError,
    Fail,
    TargetStatusProcessing,
    TargetStatusNotSuccess,
    ProjectInactive,
    RequestQuotaReached,
    TargetQuotaReached,
}

impl ResultCode {
    /// The exact string sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::TargetCreated => "TargetCreated",
            Self::AuthenticationFailure => "AuthenticationFailure",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::TargetNameExist => "TargetNameExist",
            Self::UnknownTarget => "UnknownTarget",
            Self::BadImage => "BadImage",
            Self::ImageTooLarge => "ImageTooLarge",
            Self::MetadataTooLarge => "MetadataTooLarge",
            Self::DateRangeError => "DateRangeError",
            Self::Fail => "Fail",
            Self::TargetStatusProcessing => "TargetStatusProcessing",
            Self::TargetStatusNotSuccess => "TargetStatusNotSuccess",
            Self::ProjectInactive => "ProjectInactive",
            Self::RequestQuotaReached => "RequestQuotaReached",
            Self::TargetQuotaReached => "TargetQuotaReached",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a target.
///
/// A target starts at `Processing` on creation and after any update, and
/// resolves to `Success` or `Failed` once the processing delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Processing,
    Success,
    Failed,
}

impl TargetStatus {
    /// The exact string sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
