//! Client-local working copy of one image's annotations.
//!
//! The store keeps two collections: the working copy that gestures and edit
//! actions mutate, and the snapshot last confirmed by the record store. The
//! snapshot changes only through [`AnnotationStore::reconcile`].

use labfolio_core::annotation::{Annotation, LabelSize};
use uuid::Uuid;

/// An open inline label edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: String,
    pub draft: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    working: Vec<Annotation>,
    snapshot: Vec<Annotation>,
    editing: Option<EditSession>,
}

impl AnnotationStore {
    /// Seed from the authoritative server value.
    pub fn new(persisted: Vec<Annotation>) -> Self {
        Self {
            working: persisted.clone(),
            snapshot: persisted,
            editing: None,
        }
    }

    /// Every annotation in the working copy, in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.working
    }

    /// Legend view: labeled annotations only, in insertion order.
    pub fn labeled(&self) -> impl Iterator<Item = &Annotation> {
        self.working.iter().filter(|a| a.is_labeled())
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.working.iter().find(|a| a.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.working.iter_mut().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// Add an unlabeled annotation at `(x, y)` and open it for editing.
    /// Returns the new id.
    pub fn add(&mut self, x: f64, y: f64) -> String {
        let id = Uuid::new_v4().to_string();
        self.working.push(Annotation::unlabeled(id.clone(), x, y));
        self.editing = Some(EditSession {
            id: id.clone(),
            draft: String::new(),
        });
        tracing::debug!(annotation_id = %id, x, y, "Annotation added");
        id
    }

    /// Open an inline edit seeded with the annotation's current label.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(annotation) = self.get(id) else {
            return false;
        };
        self.editing = Some(EditSession {
            id: id.to_string(),
            draft: annotation.label.clone(),
        });
        true
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let Some(session) = self.editing.as_mut() {
            session.draft = text.into();
        }
    }

    /// Commit the open draft. A draft that is blank once trimmed removes the
    /// annotation instead. Returns the id of the annotation that was edited.
    pub fn confirm_edit(&mut self) -> Option<String> {
        let session = self.editing.take()?;
        let label = session.draft.trim();
        if label.is_empty() {
            self.remove_entry(&session.id);
            tracing::debug!(annotation_id = %session.id, "Blank label discarded");
        } else if let Some(annotation) = self.get_mut(&session.id) {
            annotation.label = label.to_string();
            tracing::debug!(annotation_id = %session.id, "Label saved");
        }
        Some(session.id)
    }

    /// Close the open edit without keeping the draft. An annotation that has
    /// no stored label yet is treated as an abandoned placement and removed.
    pub fn escape_edit(&mut self) {
        let Some(session) = self.editing.take() else {
            return;
        };
        let abandoned = self.get(&session.id).is_some_and(|a| !a.is_labeled());
        if abandoned {
            self.remove_entry(&session.id);
            tracing::debug!(annotation_id = %session.id, "Placement abandoned");
        }
    }

    /// Set a label directly; blank text removes the annotation.
    pub fn update_label(&mut self, id: &str, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return self.remove(id);
        }
        match self.get_mut(id) {
            Some(annotation) => {
                annotation.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Advance the size hint one step. Returns the new size.
    pub fn cycle_size(&mut self, id: &str) -> Option<LabelSize> {
        let annotation = self.get_mut(id)?;
        annotation.size = annotation.size.next();
        Some(annotation.size)
    }

    /// Remove an annotation, cancelling its edit session if open.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.editing.as_ref().is_some_and(|s| s.id == id) {
            self.editing = None;
        }
        let removed = self.remove_entry(id);
        if removed {
            tracing::debug!(annotation_id = %id, "Annotation removed");
        }
        removed
    }

    fn remove_entry(&mut self, id: &str) -> bool {
        let before = self.working.len();
        self.working.retain(|a| a.id != id);
        self.working.len() != before
    }

    /// Shift an annotation by a percentage delta, clamped to the drag range.
    pub fn move_by(&mut self, id: &str, dx: f64, dy: f64) -> bool {
        match self.get_mut(id) {
            Some(annotation) => {
                annotation.shift(dx, dy);
                true
            }
            None => false,
        }
    }

    /// Whether the working copy differs from the last confirmed snapshot.
    pub fn is_dirty(&self) -> bool {
        self.working != self.snapshot
    }

    /// The collection to persist: labeled annotations as `{id, x, y, label,
    /// size}`.
    pub fn payload(&self) -> Vec<Annotation> {
        self.labeled().cloned().collect()
    }

    /// Replace both the working copy and the snapshot with the value the
    /// record store confirmed. Idempotent.
    pub fn reconcile(&mut self, confirmed: Vec<Annotation>) {
        if let Some(session) = &self.editing {
            if !confirmed.iter().any(|a| a.id == session.id) {
                self.editing = None;
            }
        }
        self.working = confirmed.clone();
        self.snapshot = confirmed;
    }
}
