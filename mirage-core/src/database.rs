//! The per-database target store.
//!
//! A database is an isolated collection of targets plus the credential
//! pairs requests are signed with: a server key pair for the Target API
//! and a client key pair for the Query API. Every operation that reads
//! target state takes the caller's clock, so lifecycle resolution stays
//! deterministic for tests that control time.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::result_code::TargetStatus;
use crate::signature::new_hex_id;
use crate::target::Target;

/// State-conflict and not-found failures from store operations.
///
/// Each variant pairs with exactly one result code and HTTP status at the
/// route layer, so the mapping stays deterministic for clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no target with the given id exists in this database")]
    UnknownTarget,
    #[error("another target in this database currently has this name")]
    NameExists,
    #[error("the target is still processing")]
    TargetProcessing,
    #[error("the target is not in the success state")]
    TargetNotSuccess,
    #[error("the project is inactive")]
    ProjectInactive,
}

/// Construction parameters for a [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub server_access_key: String,
    pub server_secret_key: String,
    pub client_access_key: String,
    pub client_secret_key: String,
    /// Whether the project accepts target mutations.
    pub active: bool,
    /// How long a target stays in the processing state after a mutation.
    pub processing_delay: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "mirage-database".to_owned(),
            server_access_key: new_hex_id(),
            server_secret_key: new_hex_id(),
            client_access_key: new_hex_id(),
            client_secret_key: new_hex_id(),
            active: true,
            processing_delay: Duration::milliseconds(500),
        }
    }
}

/// Fields accepted by an add-target operation.
#[derive(Debug, Clone)]
pub struct NewTarget {
    pub name: String,
    pub width: f64,
    pub image: Vec<u8>,
    pub active_flag: bool,
    pub application_metadata: Option<String>,
}

impl NewTarget {
    pub fn new(name: impl Into<String>, width: f64, image: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            image,
            active_flag: true,
            application_metadata: None,
        }
    }
}

/// Partial-update fields for an update-target operation. `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct TargetUpdate {
    pub name: Option<String>,
    pub width: Option<f64>,
    pub image: Option<Vec<u8>>,
    pub active_flag: Option<bool>,
    pub application_metadata: Option<String>,
}

/// Target counts by status bucket, as reported by the database summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
    pub failed: usize,
    pub processing: usize,
}

/// An isolated collection of targets with its credentials and counters.
#[derive(Debug)]
pub struct Database {
    pub name: String,
    pub server_access_key: String,
    pub server_secret_key: String,
    pub client_access_key: String,
    pub client_secret_key: String,
    pub active: bool,
    processing_delay: Duration,
    targets: Vec<Target>,
    request_usage: u64,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            name: config.name,
            server_access_key: config.server_access_key,
            server_secret_key: config.server_secret_key,
            client_access_key: config.client_access_key,
            client_secret_key: config.client_secret_key,
            active: config.active,
            processing_delay: config.processing_delay,
            targets: Vec::new(),
            request_usage: 0,
        }
    }

    /// Number of successful mutating requests served so far.
    pub fn request_usage(&self) -> u64 {
        self.request_usage
    }

    /// Add a target, returning its fresh id.
    ///
    /// Name uniqueness is checked against the current names of all targets
    /// in the database, case-sensitively.
    pub fn add_target(
        &mut self,
        new_target: NewTarget,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        if !self.active {
            return Err(StoreError::ProjectInactive);
        }
        if self.targets.iter().any(|t| t.name == new_target.name) {
            return Err(StoreError::NameExists);
        }

        let target = Target::new(
            new_target.name,
            new_target.width,
            new_target.image,
            new_target.active_flag,
            new_target.application_metadata,
            self.processing_delay,
            now,
        );
        let target_id = target.target_id().to_owned();
        tracing::debug!(target_id = %target_id, "target created, processing");
        self.targets.push(target);
        self.request_usage += 1;
        Ok(target_id)
    }

    pub fn target(&self, target_id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.target_id() == target_id)
    }

    /// Ids of every target in the database, in creation order.
    pub fn target_ids(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.target_id().to_owned()).collect()
    }

    /// Apply a partial update. The target must currently be in the success
    /// state; any successful update restarts its processing cycle.
    pub fn update_target(
        &mut self,
        target_id: &str,
        update: TargetUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if !self.active {
            return Err(StoreError::ProjectInactive);
        }

        let index = self
            .targets
            .iter()
            .position(|t| t.target_id() == target_id)
            .ok_or(StoreError::UnknownTarget)?;

        if self.targets[index].status_at(now) != TargetStatus::Success {
            return Err(StoreError::TargetNotSuccess);
        }

        if let Some(name) = &update.name {
            let collides = self
                .targets
                .iter()
                .any(|t| t.target_id() != target_id && &t.name == name);
            if collides {
                return Err(StoreError::NameExists);
            }
        }

        let target = &mut self.targets[index];
        if let Some(name) = update.name {
            target.name = name;
        }
        if let Some(width) = update.width {
            target.width = width;
        }
        if let Some(active_flag) = update.active_flag {
            target.active_flag = active_flag;
        }
        if let Some(metadata) = update.application_metadata {
            target.application_metadata = Some(metadata);
        }
        if let Some(image) = update.image {
            target.set_image(image);
        }
        target.touch(now);
        tracing::debug!(target_id = %target_id, "target updated, reprocessing");
        self.request_usage += 1;
        Ok(())
    }

    /// Delete a target. Rejected while the target is processing.
    pub fn delete_target(
        &mut self,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if !self.active {
            return Err(StoreError::ProjectInactive);
        }

        let target = self.target(target_id).ok_or(StoreError::UnknownTarget)?;
        if target.status_at(now) == TargetStatus::Processing {
            return Err(StoreError::TargetProcessing);
        }

        self.targets.retain(|t| t.target_id() != target_id);
        tracing::debug!(target_id = %target_id, "target deleted");
        self.request_usage += 1;
        Ok(())
    }

    /// Ids of other processed, active targets whose image content matches
    /// the given target's, excluding the target itself.
    pub fn duplicates(
        &self,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let target = self.target(target_id).ok_or(StoreError::UnknownTarget)?;
        let digest = target.image_digest();

        Ok(self
            .targets
            .iter()
            .filter(|t| {
                t.target_id() != target_id
                    && t.active_flag
                    && t.status_at(now) != TargetStatus::Processing
                    && t.image_digest() == digest
            })
            .map(|t| t.target_id().to_owned())
            .collect())
    }

    /// Successfully processed, active targets whose image content matches
    /// the submitted bytes, for query simulation.
    pub fn matching_targets(&self, image: &[u8], now: DateTime<Utc>) -> Vec<&Target> {
        let digest = crate::image_analysis::content_digest(image);
        self.targets
            .iter()
            .filter(|t| {
                t.active_flag
                    && t.status_at(now) == TargetStatus::Success
                    && t.image_digest() == digest
            })
            .collect()
    }

    /// Target counts by status bucket as of `now`.
    pub fn status_counts(&self, now: DateTime<Utc>) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for target in &self.targets {
            match target.status_at(now) {
                TargetStatus::Processing => counts.processing += 1,
                TargetStatus::Failed => counts.failed += 1,
                TargetStatus::Success if target.active_flag => counts.active += 1,
                TargetStatus::Success => counts.inactive += 1,
            }
        }
        counts
    }
}
