//! Mirage Core - model layer for the cloud target API simulation
//!
//! This crate holds everything about the fake Vuforia-style target service
//! that is independent of HTTP plumbing:
//!
//! - The canonical result-code and target-status vocabularies
//! - The HMAC-SHA1 request signature scheme, reproducible byte-for-byte by
//!   both the client signer and the server verifier
//! - Image analysis: decoding, format and color-mode checks, and the
//!   trackability heuristic that decides whether a target processes to
//!   success or failure
//! - The `Target` record with its pure, time-driven lifecycle resolution
//! - The per-database target store and its operations
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use mirage_core::{Database, DatabaseConfig, NewTarget, TargetStatus};
//!
//! let mut database = Database::new(DatabaseConfig {
//!     name: "my-database".to_owned(),
//!     processing_delay: Duration::milliseconds(500),
//!     ..DatabaseConfig::default()
//! });
//!
//! let png = include_bytes!("../tests/fixtures/high_contrast.png").to_vec();
//! let now = Utc::now();
//! let target_id = database
//!     .add_target(NewTarget::new("my-target", 1.0, png), now)
//!     .unwrap();
//!
//! let target = database.target(&target_id).unwrap();
//! assert_eq!(target.status_at(now), TargetStatus::Processing);
//! assert_eq!(
//!     target.status_at(now + Duration::seconds(1)),
//!     TargetStatus::Success,
//! );
//! ```

pub mod database;
pub mod image_analysis;
pub mod result_code;
pub mod signature;
pub mod target;

pub use database::{
    Database, DatabaseConfig, NewTarget, StatusCounts, StoreError, TargetUpdate,
};
pub use image_analysis::{
    content_digest, derive_tracking_rating, AnalyzedImage, ImageError, MAX_IMAGE_BYTES,
    MAX_METADATA_BYTES,
};
pub use result_code::{ResultCode, TargetStatus};
pub use signature::{
    access_key_from_header, authorization_header, new_hex_id, parse_rfc_1123_date, rfc_1123_date,
};
pub use target::Target;
