//! Typed views of the JSON reports the service returns.

use serde::Deserialize;

use mirage_core::TargetStatus;

/// The `target_record` object of a get-target response.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetRecord {
    pub target_id: String,
    pub active_flag: bool,
    pub name: String,
    pub width: f64,
    /// -1 while processing, 0 on failure, 0 to 5 on success.
    pub tracking_rating: i32,
    pub reco_rating: String,
}

/// A get-target response: the record plus the current lifecycle status.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetStatusAndRecord {
    pub status: TargetStatus,
    pub target_record: TargetRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSummaryReport {
    pub name: String,
    pub active_images: u64,
    pub inactive_images: u64,
    pub failed_images: u64,
    pub processing_images: u64,
    pub target_quota: u64,
    pub request_quota: u64,
    pub request_usage: u64,
    pub reco_threshold: u64,
    pub total_recos: u64,
    pub current_month_recos: u64,
    pub previous_month_recos: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetSummaryReport {
    pub status: TargetStatus,
    pub database_name: String,
    pub target_name: String,
    /// Day the target was created, formatted `YYYY-MM-DD`.
    pub upload_date: String,
    pub active_flag: bool,
    pub tracking_rating: i32,
    pub total_recos: u64,
    pub current_month_recos: u64,
    pub previous_month_recos: u64,
}

/// One recognized target in a query response.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    pub target_id: String,
    #[serde(default)]
    pub target_data: Option<QueryTargetData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryTargetData {
    pub name: String,
    /// Base64 metadata as stored, or null when the target has none.
    pub application_metadata: Option<String>,
    /// Unix timestamp of the target's last modification.
    pub target_timestamp: i64,
}
