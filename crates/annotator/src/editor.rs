//! One image's editing session: gesture state, view state, the annotation
//! store and the text field drafts, driven by UI events.

use labfolio_core::annotation::{Annotation, LabelSize};

use crate::bridge::{self, BridgeError, FieldDraft, SaveStatus};
use crate::client::{ClientError, ImageRecord, ImageRecordClient, ImageRef};
use crate::coords::RenderedRect;
use crate::gesture::{transition, Effect, GestureContext, GestureEvent, GestureState};
use crate::store::{AnnotationStore, EditSession};
use crate::view::{ViewState, Viewport};

/// Layout measured by the UI at event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// On-screen box of the rendered image at the current zoom and scroll.
    pub image: RenderedRect,
    /// Size of the scroll container, when known.
    pub viewport: Option<Viewport>,
}

impl Frame {
    pub const fn new(image: RenderedRect) -> Self {
        Self {
            image,
            viewport: None,
        }
    }

    pub const fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Editor {
    image: ImageRef,
    read_only: bool,
    gesture: GestureState,
    view: ViewState,
    store: AnnotationStore,
    description: FieldDraft,
    notes: FieldDraft,
    save_status: SaveStatus,
}

impl Editor {
    pub fn new(record: &ImageRecord, read_only: bool) -> Self {
        Self {
            image: ImageRef {
                experiment_number: record.experiment_number,
                image_id: record.id,
            },
            read_only,
            gesture: GestureState::Idle,
            view: ViewState::new(),
            store: AnnotationStore::new(record.annotations.clone()),
            description: FieldDraft::new(record.description.clone()),
            notes: FieldDraft::new(record.notes.clone()),
            save_status: SaveStatus::Idle,
        }
    }

    /// Fetch the authoritative record and open an editor on it.
    pub async fn load(
        client: &dyn ImageRecordClient,
        image: ImageRef,
        read_only: bool,
    ) -> Result<Self, ClientError> {
        let record = client.fetch_image(&image).await?;
        Ok(Self::new(&record, read_only))
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn is_placing(&self) -> bool {
        self.gesture.is_placing()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.store.editing()
    }

    pub fn description(&self) -> &FieldDraft {
        &self.description
    }

    pub fn notes(&self) -> &FieldDraft {
        &self.notes
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    /// Unsaved annotation changes.
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty() || self.description.is_dirty() || self.notes.is_dirty()
    }

    // ---- Gestures ----

    fn context(&self, image: RenderedRect) -> GestureContext {
        GestureContext {
            zoom: self.view.zoom(),
            scroll: self.view.scroll(),
            image,
            read_only: self.read_only,
        }
    }

    /// Feed one input event through the gesture classifier and apply its
    /// effects. Returns whether the event was consumed.
    pub fn handle(&mut self, event: GestureEvent, frame: &Frame) -> bool {
        let step = transition(&self.gesture, &event, &self.context(frame.image));
        if step.state != self.gesture {
            tracing::trace!(from = ?self.gesture, to = ?step.state, ?event, "Gesture transition");
        }
        self.gesture = step.state;
        for effect in step.effects {
            self.apply(effect, frame);
        }
        step.consumed
    }

    fn apply(&mut self, effect: Effect, frame: &Frame) {
        match effect {
            Effect::CreateAnnotation { x, y } => {
                self.store.add(x, y);
            }
            Effect::MoveAnnotation { id, dx, dy } => {
                self.store.move_by(&id, dx, dy);
            }
            Effect::ScrollTo(offset) => self.view.scroll_to(offset, frame.viewport.as_ref()),
            Effect::SetZoom(zoom) => {
                self.view.set_zoom(zoom);
            }
        }
    }

    /// The "add label" button.
    pub fn toggle_placing(&mut self) -> bool {
        let frame = Frame::new(RenderedRect::new(0.0, 0.0, 0.0, 0.0));
        self.handle(GestureEvent::ToggleAddLabel, &frame);
        self.is_placing()
    }

    // ---- Inline edit and label actions ----

    pub fn begin_edit(&mut self, id: &str) -> bool {
        !self.read_only && self.store.begin_edit(id)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.store.set_draft(text);
    }

    pub fn confirm_edit(&mut self) -> Option<String> {
        self.store.confirm_edit()
    }

    pub fn escape_edit(&mut self) {
        self.store.escape_edit();
    }

    pub fn cycle_size(&mut self, id: &str) -> Option<LabelSize> {
        if self.read_only {
            return None;
        }
        self.store.cycle_size(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        !self.read_only && self.store.remove(id)
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        if !self.read_only {
            self.description.set(text);
        }
    }

    pub fn set_notes(&mut self, text: impl Into<String>) {
        if !self.read_only {
            self.notes.set(text);
        }
    }

    // ---- View ----

    pub fn zoom_in(&mut self) -> f64 {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.view.zoom_out()
    }

    pub fn reset_zoom(&mut self) {
        self.view.reset_zoom();
    }

    pub fn toggle_labels(&mut self) -> bool {
        self.view.toggle_labels()
    }

    // ---- Saving ----

    /// Mark a save as in flight. Returns `false` when saving is not allowed.
    pub fn begin_save(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        self.save_status = SaveStatus::Saving;
        true
    }

    pub fn finish_save<T>(&mut self, result: &Result<T, BridgeError>) {
        self.save_status = match result {
            Ok(_) => SaveStatus::Idle,
            Err(err) => SaveStatus::Failed(err.to_string()),
        };
    }

    /// Persist the annotation list.
    pub async fn save(
        &mut self,
        client: &dyn ImageRecordClient,
    ) -> Result<ImageRecord, BridgeError> {
        if !self.begin_save() {
            return Err(BridgeError::ReadOnly);
        }
        let result = bridge::save_annotations(client, &self.image, &mut self.store).await;
        self.finish_save(&result);
        result
    }

    pub async fn save_notes(
        &mut self,
        client: &dyn ImageRecordClient,
    ) -> Result<ImageRecord, BridgeError> {
        if !self.begin_save() {
            return Err(BridgeError::ReadOnly);
        }
        let result = bridge::save_notes(client, &self.image, &mut self.notes).await;
        self.finish_save(&result);
        result
    }

    pub async fn save_description(
        &mut self,
        client: &dyn ImageRecordClient,
    ) -> Result<ImageRecord, BridgeError> {
        if !self.begin_save() {
            return Err(BridgeError::ReadOnly);
        }
        let result = bridge::save_description(client, &self.image, &mut self.description).await;
        self.finish_save(&result);
        result
    }
}
