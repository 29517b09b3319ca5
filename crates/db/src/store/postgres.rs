//! PostgreSQL-backed record store.

use async_trait::async_trait;
use labfolio_core::error::CoreError;
use labfolio_core::experiment::next_experiment_number;
use labfolio_core::image_update::ImageUpdate;
use labfolio_core::types::{ExperimentNumber, ImageId};

use crate::models::experiment::{CatalogStats, Experiment, UpdateExperimentMeta};
use crate::models::image::{ExperimentImage, NewImage};
use crate::repositories::{ExperimentRepo, ImageRepo};
use crate::store::{RecordStore, StoreError};
use crate::DbPool;

/// A [`RecordStore`] over a sqlx connection pool.
///
/// Built with [`PgRecordStore::open`] by the composition root and released
/// with [`RecordStore::close`] during shutdown.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    /// Connect, verify the connection and apply pending migrations.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = crate::create_pool(database_url, max_connections).await?;
        tracing::info!(max_connections, "Database connection pool created");

        crate::health_check(&pool).await?;
        tracing::info!("Database health check passed");

        crate::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (migrations are assumed to be applied).
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }

    async fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError> {
        Ok(ExperimentRepo::list(&self.pool).await?)
    }

    async fn get_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Experiment>, StoreError> {
        Ok(ExperimentRepo::find_by_number(&self.pool, number).await?)
    }

    async fn create_experiment(
        &self,
        number: ExperimentNumber,
        name: &str,
        description: &str,
    ) -> Result<Experiment, StoreError> {
        match ExperimentRepo::create(&self.pool, number, name, description).await {
            Ok(experiment) => Ok(experiment),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CoreError::Conflict(format!("Experiment {number} already exists")).into())
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn next_experiment_number(&self) -> Result<ExperimentNumber, StoreError> {
        let highest = ExperimentRepo::max_number(&self.pool).await?;
        Ok(next_experiment_number(highest))
    }

    async fn update_experiment_meta(
        &self,
        number: ExperimentNumber,
        update: &UpdateExperimentMeta,
    ) -> Result<Option<Experiment>, StoreError> {
        Ok(ExperimentRepo::update_meta(&self.pool, number, update).await?)
    }

    async fn delete_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Vec<ExperimentImage>>, StoreError> {
        Ok(ImageRepo::delete_experiment_cascade(&self.pool, number).await?)
    }

    async fn list_images(
        &self,
        number: ExperimentNumber,
    ) -> Result<Vec<ExperimentImage>, StoreError> {
        Ok(ImageRepo::list_by_experiment(&self.pool, number).await?)
    }

    async fn get_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        Ok(ImageRepo::find(&self.pool, number, image_id).await?)
    }

    async fn add_image(
        &self,
        number: ExperimentNumber,
        image: NewImage,
    ) -> Result<ExperimentImage, StoreError> {
        Ok(ImageRepo::create(&self.pool, number, &image).await?)
    }

    async fn apply_image_update(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
        update: &ImageUpdate,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        Ok(ImageRepo::update_field(&self.pool, number, image_id, update).await?)
    }

    async fn delete_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        Ok(ImageRepo::delete(&self.pool, number, image_id).await?)
    }

    async fn stats(&self) -> Result<CatalogStats, StoreError> {
        Ok(ExperimentRepo::stats(&self.pool).await?)
    }
}
