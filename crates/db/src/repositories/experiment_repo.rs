//! Repository for the `experiments` table.

use labfolio_core::types::ExperimentNumber;
use sqlx::PgPool;

use crate::models::experiment::{CatalogStats, Experiment, UpdateExperimentMeta};

/// Column list for experiments queries.
const COLUMNS: &str = "number, name, description, image_count, created_at, updated_at";

/// Provides CRUD operations for experiments.
pub struct ExperimentRepo;

impl ExperimentRepo {
    /// Insert a new experiment, returning the created row.
    ///
    /// A taken number surfaces as a primary-key violation.
    pub async fn create(
        pool: &PgPool,
        number: ExperimentNumber,
        name: &str,
        description: &str,
    ) -> Result<Experiment, sqlx::Error> {
        let query = format!(
            "INSERT INTO experiments (number, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Experiment>(&query)
            .bind(number)
            .bind(name)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    /// Find an experiment by number.
    pub async fn find_by_number(
        pool: &PgPool,
        number: ExperimentNumber,
    ) -> Result<Option<Experiment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM experiments WHERE number = $1");
        sqlx::query_as::<_, Experiment>(&query)
            .bind(number)
            .fetch_optional(pool)
            .await
    }

    /// List all experiments, ordered by number ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<Experiment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM experiments ORDER BY number ASC");
        sqlx::query_as::<_, Experiment>(&query)
            .fetch_all(pool)
            .await
    }

    /// Highest experiment number in use, if any.
    pub async fn max_number(pool: &PgPool) -> Result<Option<ExperimentNumber>, sqlx::Error> {
        let row: (Option<ExperimentNumber>,) =
            sqlx::query_as("SELECT MAX(number) FROM experiments")
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Update name and/or description. Absent fields are left unchanged.
    pub async fn update_meta(
        pool: &PgPool,
        number: ExperimentNumber,
        input: &UpdateExperimentMeta,
    ) -> Result<Option<Experiment>, sqlx::Error> {
        let query = format!(
            "UPDATE experiments SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = now()
             WHERE number = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Experiment>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(number)
            .fetch_optional(pool)
            .await
    }

    /// Catalog-wide totals.
    pub async fn stats(pool: &PgPool) -> Result<CatalogStats, sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(image_count), 0)::BIGINT FROM experiments",
        )
        .fetch_one(pool)
        .await?;
        Ok(CatalogStats {
            total_experiments: row.0,
            total_images: row.1,
        })
    }
}
