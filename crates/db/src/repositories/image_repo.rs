//! Repository for the `experiment_images` table.
//!
//! Writes that touch both an image and its parent's `image_count` run in a
//! single transaction, with the parent row locked so concurrent uploads to
//! the same experiment serialise on order assignment.

use labfolio_core::experiment::default_experiment_name;
use labfolio_core::image_update::ImageUpdate;
use labfolio_core::types::{ExperimentNumber, ImageId};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::image::{ExperimentImage, NewImage};

/// Column list for experiment_images queries.
const COLUMNS: &str = "id, experiment_number, filename, optimized, thumbnail, original_name, \
    description, notes, annotations, sort_order, uploaded_by, mime_type, size, created_at";

/// Provides CRUD operations for experiment images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert an image, creating its experiment when absent.
    ///
    /// Assigns `sort_order = count + 1` and recomputes the experiment's
    /// `image_count` before committing.
    pub async fn create(
        pool: &PgPool,
        number: ExperimentNumber,
        input: &NewImage,
    ) -> Result<ExperimentImage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO experiments (number, name, description)
             VALUES ($1, $2, '')
             ON CONFLICT (number) DO NOTHING",
        )
        .bind(number)
        .bind(default_experiment_name(number))
        .execute(&mut *tx)
        .await?;

        sqlx::query("SELECT number FROM experiments WHERE number = $1 FOR UPDATE")
            .bind(number)
            .execute(&mut *tx)
            .await?;

        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM experiment_images WHERE experiment_number = $1")
                .bind(number)
                .fetch_one(&mut *tx)
                .await?;

        let query = format!(
            "INSERT INTO experiment_images
                (id, experiment_number, filename, optimized, thumbnail, original_name,
                 description, sort_order, uploaded_by, mime_type, size)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let image = sqlx::query_as::<_, ExperimentImage>(&query)
            .bind(Uuid::new_v4())
            .bind(number)
            .bind(&input.filename)
            .bind(&input.optimized)
            .bind(&input.thumbnail)
            .bind(&input.original_name)
            .bind(&input.description)
            .bind(existing + 1)
            .bind(&input.uploaded_by)
            .bind(&input.mime_type)
            .bind(input.size)
            .fetch_one(&mut *tx)
            .await?;

        recount(&mut tx, number).await?;
        tx.commit().await?;
        Ok(image)
    }

    /// Find an image by id within an experiment.
    pub async fn find(
        pool: &PgPool,
        number: ExperimentNumber,
        id: ImageId,
    ) -> Result<Option<ExperimentImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM experiment_images
             WHERE experiment_number = $1 AND id = $2"
        );
        sqlx::query_as::<_, ExperimentImage>(&query)
            .bind(number)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an experiment's images in upload order.
    pub async fn list_by_experiment(
        pool: &PgPool,
        number: ExperimentNumber,
    ) -> Result<Vec<ExperimentImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM experiment_images
             WHERE experiment_number = $1
             ORDER BY sort_order ASC"
        );
        sqlx::query_as::<_, ExperimentImage>(&query)
            .bind(number)
            .fetch_all(pool)
            .await
    }

    /// Write exactly the field named by `update`.
    pub async fn update_field(
        pool: &PgPool,
        number: ExperimentNumber,
        id: ImageId,
        update: &ImageUpdate,
    ) -> Result<Option<ExperimentImage>, sqlx::Error> {
        let column = match update {
            ImageUpdate::SetDescription(_) => "description",
            ImageUpdate::SetNotes(_) => "notes",
            ImageUpdate::SetAnnotations(_) => "annotations",
        };
        let query = format!(
            "UPDATE experiment_images SET {column} = $1
             WHERE experiment_number = $2 AND id = $3
             RETURNING {COLUMNS}"
        );
        let statement = sqlx::query_as::<_, ExperimentImage>(&query);
        let statement = match update {
            ImageUpdate::SetDescription(text) | ImageUpdate::SetNotes(text) => statement.bind(text),
            ImageUpdate::SetAnnotations(list) => statement.bind(Json(list)),
        };
        statement.bind(number).bind(id).fetch_optional(pool).await
    }

    /// Delete an image and recompute the parent's count.
    pub async fn delete(
        pool: &PgPool,
        number: ExperimentNumber,
        id: ImageId,
    ) -> Result<Option<ExperimentImage>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "DELETE FROM experiment_images
             WHERE experiment_number = $1 AND id = $2
             RETURNING {COLUMNS}"
        );
        let removed = sqlx::query_as::<_, ExperimentImage>(&query)
            .bind(number)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if removed.is_some() {
            recount(&mut tx, number).await?;
        }
        tx.commit().await?;
        Ok(removed)
    }

    /// Delete an experiment and all of its images.
    ///
    /// Returns the deleted images, or `None` if the experiment did not exist.
    pub async fn delete_experiment_cascade(
        pool: &PgPool,
        number: ExperimentNumber,
    ) -> Result<Option<Vec<ExperimentImage>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "DELETE FROM experiment_images
             WHERE experiment_number = $1
             RETURNING {COLUMNS}"
        );
        let mut images = sqlx::query_as::<_, ExperimentImage>(&query)
            .bind(number)
            .fetch_all(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM experiments WHERE number = $1")
            .bind(number)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;

        images.sort_by_key(|i| i.order);
        Ok(Some(images))
    }
}

/// Set `image_count` to the current number of image rows.
async fn recount(conn: &mut PgConnection, number: ExperimentNumber) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE experiments SET
            image_count = (SELECT COUNT(*) FROM experiment_images WHERE experiment_number = $1),
            updated_at = now()
         WHERE number = $1",
    )
    .bind(number)
    .execute(conn)
    .await?;
    Ok(())
}
