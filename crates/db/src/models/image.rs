//! Experiment image model and DTOs.

use labfolio_core::annotation::Annotation;
use labfolio_core::types::{ExperimentNumber, ImageId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `experiment_images` table.
///
/// `notes` and `annotations` default to empty on input so records written
/// before those fields existed still load; they are always present on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentImage {
    pub id: ImageId,
    pub experiment_number: ExperimentNumber,
    /// Public path of the original upload.
    pub filename: String,
    /// Display-size variant for the detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<String>,
    /// Small variant for the gallery grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub original_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    #[sqlx(json)]
    pub annotations: Vec<Annotation>,
    /// 1-based position within the experiment, fixed at upload time.
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub uploaded_by: String,
    pub mime_type: String,
    /// Original size in bytes.
    pub size: i64,
    pub created_at: Timestamp,
}

impl ExperimentImage {
    /// Public paths of every stored file backing this record.
    pub fn stored_paths(&self) -> Vec<&str> {
        std::iter::once(self.filename.as_str())
            .chain(self.optimized.as_deref())
            .chain(self.thumbnail.as_deref())
            .collect()
    }
}

/// Input for registering a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub optimized: Option<String>,
    pub thumbnail: Option<String>,
    pub original_name: String,
    pub description: String,
    pub uploaded_by: String,
    pub mime_type: String,
    pub size: i64,
}
