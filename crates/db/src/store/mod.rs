//! The record store seam.
//!
//! Handlers hold an `Arc<dyn RecordStore>` built once by the binary's
//! composition root; nothing reaches a connection through global state.
//!
//! Write granularity is per field: [`RecordStore::apply_image_update`]
//! replaces exactly one of description, notes or annotations and leaves the
//! others untouched. Concurrent writes to the same field are last-write-wins.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use labfolio_core::error::CoreError;
use labfolio_core::image_update::ImageUpdate;
use labfolio_core::types::{ExperimentNumber, ImageId};

use crate::models::experiment::{CatalogStats, Experiment, UpdateExperimentMeta};
use crate::models::image::{ExperimentImage, NewImage};

/// Errors raised by a record store engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error (conflict, validation).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Experiment and image persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Confirm the backing engine is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Release the engine's resources. Further calls may fail.
    async fn close(&self);

    /// All experiments, ordered by number ascending.
    async fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError>;

    async fn get_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Experiment>, StoreError>;

    /// Create an experiment. Fails with [`CoreError::Conflict`] when the
    /// number is already taken.
    async fn create_experiment(
        &self,
        number: ExperimentNumber,
        name: &str,
        description: &str,
    ) -> Result<Experiment, StoreError>;

    /// One past the highest existing experiment number, or 1.
    async fn next_experiment_number(&self) -> Result<ExperimentNumber, StoreError>;

    /// Apply name/description changes. `None` when the experiment is absent.
    async fn update_experiment_meta(
        &self,
        number: ExperimentNumber,
        update: &UpdateExperimentMeta,
    ) -> Result<Option<Experiment>, StoreError>;

    /// Delete an experiment together with all of its image records.
    ///
    /// Returns the removed images so their files can be cleaned up, or
    /// `None` when the experiment did not exist.
    async fn delete_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Vec<ExperimentImage>>, StoreError>;

    /// Images of an experiment, ordered by `order` ascending.
    async fn list_images(
        &self,
        number: ExperimentNumber,
    ) -> Result<Vec<ExperimentImage>, StoreError>;

    async fn get_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError>;

    /// Register an upload, creating the experiment when absent.
    ///
    /// Assigns `order = existing + 1` and recomputes the experiment's
    /// `image_count` atomically with the insert.
    async fn add_image(
        &self,
        number: ExperimentNumber,
        image: NewImage,
    ) -> Result<ExperimentImage, StoreError>;

    /// Replace one field of an image. `None` when the image id is unknown
    /// within the experiment.
    async fn apply_image_update(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
        update: &ImageUpdate,
    ) -> Result<Option<ExperimentImage>, StoreError>;

    /// Delete an image record and recompute the parent's `image_count`.
    /// Returns the removed record, or `None` when absent.
    async fn delete_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError>;

    async fn stats(&self) -> Result<CatalogStats, StoreError>;
}
