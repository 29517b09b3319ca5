//! Save round trips between local editing state and the record store.
//!
//! Each save sends exactly one field. Local state moves only after the
//! record store confirms: on success the working copy and snapshot are
//! replaced by the returned record's value, on failure nothing changes.

use labfolio_core::error::CoreError;
use labfolio_core::image_update::ImageUpdate;

use crate::client::{ClientError, ImageRecord, ImageRecordClient, ImageRef};
use crate::store::AnnotationStore;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The local value would be rejected by the record store.
    #[error(transparent)]
    Validation(CoreError),

    #[error("Editor is read-only")]
    ReadOnly,
}

/// Progress of the last explicit save, for the save button and the
/// failure indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Failed(String),
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }
}

/// Working copy and confirmed snapshot of one text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDraft {
    working: String,
    snapshot: String,
}

impl FieldDraft {
    pub fn new(persisted: impl Into<String>) -> Self {
        let persisted = persisted.into();
        Self {
            working: persisted.clone(),
            snapshot: persisted,
        }
    }

    pub fn value(&self) -> &str {
        &self.working
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.working = text.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.snapshot
    }

    /// Discard local edits.
    pub fn revert(&mut self) {
        self.working = self.snapshot.clone();
    }

    pub fn reconcile(&mut self, confirmed: impl Into<String>) {
        let confirmed = confirmed.into();
        self.working = confirmed.clone();
        self.snapshot = confirmed;
    }
}

async fn send(
    client: &dyn ImageRecordClient,
    image: &ImageRef,
    update: ImageUpdate,
) -> Result<ImageRecord, BridgeError> {
    update.validate().map_err(BridgeError::Validation)?;
    let field = update.field_name();
    match client.update_image(image, &update).await {
        Ok(record) => Ok(record),
        Err(err) => {
            tracing::warn!(
                experiment_number = image.experiment_number,
                image_id = %image.image_id,
                field,
                error = %err,
                "Image save failed",
            );
            Err(err.into())
        }
    }
}

/// Persist the labeled annotations and reconcile the store with the
/// confirmed list.
pub async fn save_annotations(
    client: &dyn ImageRecordClient,
    image: &ImageRef,
    store: &mut AnnotationStore,
) -> Result<ImageRecord, BridgeError> {
    let record = send(client, image, ImageUpdate::SetAnnotations(store.payload())).await?;
    store.reconcile(record.annotations.clone());
    tracing::debug!(
        experiment_number = image.experiment_number,
        image_id = %image.image_id,
        count = record.annotations.len(),
        "Annotations saved",
    );
    Ok(record)
}

pub async fn save_notes(
    client: &dyn ImageRecordClient,
    image: &ImageRef,
    notes: &mut FieldDraft,
) -> Result<ImageRecord, BridgeError> {
    let record = send(client, image, ImageUpdate::SetNotes(notes.value().to_string())).await?;
    notes.reconcile(record.notes.clone());
    tracing::debug!(image_id = %image.image_id, "Notes saved");
    Ok(record)
}

pub async fn save_description(
    client: &dyn ImageRecordClient,
    image: &ImageRef,
    description: &mut FieldDraft,
) -> Result<ImageRecord, BridgeError> {
    let update = ImageUpdate::SetDescription(description.value().to_string());
    let record = send(client, image, update).await?;
    description.reconcile(record.description.clone());
    tracing::debug!(image_id = %image.image_id, "Description saved");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_draft_tracks_dirty_state() {
        let mut notes = FieldDraft::new("Initial");
        assert!(!notes.is_dirty());

        notes.set("Edited");
        assert!(notes.is_dirty());
        assert_eq!(notes.value(), "Edited");

        notes.revert();
        assert!(!notes.is_dirty());
        assert_eq!(notes.value(), "Initial");

        notes.set("Saved elsewhere");
        notes.reconcile("Saved elsewhere");
        assert!(!notes.is_dirty());
    }

    #[test]
    fn save_status_reports_in_flight() {
        assert!(SaveStatus::Saving.is_saving());
        assert!(!SaveStatus::Failed("offline".into()).is_saving());
        assert_eq!(SaveStatus::default(), SaveStatus::Idle);
    }
}
