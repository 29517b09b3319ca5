//! Experiment model and DTOs.

use labfolio_core::types::{ExperimentNumber, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `experiments` table.
///
/// `image_count` is derived: it is recomputed whenever an image is added to
/// or removed from the experiment and has no other write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub number: ExperimentNumber,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an experiment. `number` is auto-assigned when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExperiment {
    pub number: Option<ExperimentNumber>,
    pub name: String,
    pub description: Option<String>,
}

/// DTO for renaming or re-describing an experiment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExperimentMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Catalog-wide totals shown on the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_experiments: i64,
    pub total_images: i64,
}
