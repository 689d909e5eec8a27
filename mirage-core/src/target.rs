//! The target record and its time-driven lifecycle.
//!
//! A target is `Processing` for a fixed delay after creation and after
//! every update, then resolves to `Success` or `Failed`. The terminal
//! outcome and the tracking rating are precomputed from the image at
//! mutation time, so status resolution is a pure function of the clock and
//! repeated reads always agree.

use chrono::{DateTime, Duration, Utc};

use crate::image_analysis::{self, AnalyzedImage};
use crate::result_code::TargetStatus;
use crate::signature::new_hex_id;

/// Terminal outcome a processing cycle resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProcessingOutcome {
    status: TargetStatus,
    tracking_rating: i32,
}

impl ProcessingOutcome {
    /// Decide success or failure from the image, deriving a stable rating.
    ///
    /// When an update supplies a different image that happens to derive the
    /// same rating as before, the rating is nudged by one so a rating
    /// change is observable.
    fn from_image(bytes: &[u8], previous: Option<&ProcessingOutcome>) -> Self {
        let trackable = AnalyzedImage::decode(bytes)
            .map(|analyzed| analyzed.trackable())
            .unwrap_or(false);

        if !trackable {
            return Self {
                status: TargetStatus::Failed,
                tracking_rating: 0,
            };
        }

        let mut rating = image_analysis::derive_tracking_rating(bytes);
        if let Some(previous) = previous {
            if previous.status == TargetStatus::Success && previous.tracking_rating == rating {
                rating = (rating + 1) % 6;
            }
        }
        Self {
            status: TargetStatus::Success,
            tracking_rating: rating,
        }
    }
}

/// One uploaded reference image and its metadata.
#[derive(Debug, Clone)]
pub struct Target {
    target_id: String,
    pub name: String,
    pub width: f64,
    pub active_flag: bool,
    /// Opaque application metadata, kept base64-encoded as submitted.
    pub application_metadata: Option<String>,
    image: Vec<u8>,
    image_digest: [u8; 16],
    upload_date: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    processing_delay: Duration,
    outcome: ProcessingOutcome,
}

impl Target {
    pub fn new(
        name: String,
        width: f64,
        image: Vec<u8>,
        active_flag: bool,
        application_metadata: Option<String>,
        processing_delay: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let outcome = ProcessingOutcome::from_image(&image, None);
        let image_digest = image_analysis::content_digest(&image);
        Self {
            target_id: new_hex_id(),
            name,
            width,
            active_flag,
            application_metadata,
            image,
            image_digest,
            upload_date: now,
            last_modified: now,
            processing_delay,
            outcome,
        }
    }

    /// The immutable 32-character lowercase hex id.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn upload_date(&self) -> DateTime<Utc> {
        self.upload_date
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Digest of the stored image bytes, for duplicate and query matching.
    pub fn image_digest(&self) -> [u8; 16] {
        self.image_digest
    }

    /// Resolve the status as of `now`.
    ///
    /// The transition out of `Processing` is purely time-driven: strictly
    /// more than the processing delay must have elapsed since the last
    /// mutation before the terminal outcome becomes visible.
    pub fn status_at(&self, now: DateTime<Utc>) -> TargetStatus {
        if now - self.last_modified <= self.processing_delay {
            TargetStatus::Processing
        } else {
            self.outcome.status
        }
    }

    /// The tracking rating as of `now`: -1 while processing, the stable
    /// derived rating in `[0, 5]` on success, 0 on failure.
    pub fn tracking_rating_at(&self, now: DateTime<Utc>) -> i32 {
        match self.status_at(now) {
            TargetStatus::Processing => -1,
            _ => self.outcome.tracking_rating,
        }
    }

    /// Replace the stored image, recomputing the processing outcome.
    pub(crate) fn set_image(&mut self, image: Vec<u8>) {
        let previous = self.outcome;
        self.outcome = ProcessingOutcome::from_image(&image, Some(&previous));
        self.image_digest = image_analysis::content_digest(&image);
        self.image = image;
    }

    /// Stamp a mutation, restarting the processing cycle.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = now;
    }
}
