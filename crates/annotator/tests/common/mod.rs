//! Shared fixtures for annotator integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use labfolio_annotator::coords::{RenderedRect, ScreenPoint};
use labfolio_annotator::gesture::{GestureEvent, PointerTarget};
use labfolio_annotator::{ClientError, Editor, Frame, ImageRecord, ImageRecordClient, ImageRef};
use labfolio_core::annotation::Annotation;
use labfolio_core::image_update::ImageUpdate;
use uuid::Uuid;

pub fn record(annotations: Vec<Annotation>) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4(),
        experiment_number: 1,
        filename: "/uploads/1/leaf.png".into(),
        optimized: Some("/uploads/1/leaf_opt.jpg".into()),
        thumbnail: Some("/uploads/1/leaf_thumb.jpg".into()),
        original_name: "leaf.png".into(),
        description: "Leaf cross-section".into(),
        notes: String::new(),
        annotations,
        order: 1,
        uploaded_by: "Anonymous".into(),
        mime_type: "image/png".into(),
        size: 2048,
        created_at: chrono::Utc::now(),
    }
}

pub fn labeled(id: &str, x: f64, y: f64, label: &str) -> Annotation {
    Annotation {
        label: label.into(),
        ..Annotation::unlabeled(id, x, y)
    }
}

/// In-memory record store with a switch to simulate network failure.
pub struct FakeClient {
    record: Mutex<Option<ImageRecord>>,
    failing: AtomicBool,
    pub updates: Mutex<Vec<ImageUpdate>>,
}

impl FakeClient {
    pub fn new(record: ImageRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            failing: AtomicBool::new(false),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate another session deleting the image.
    pub fn delete(&self) {
        *self.record.lock().unwrap() = None;
    }

    pub fn stored(&self) -> ImageRecord {
        self.record.lock().unwrap().clone().expect("record was deleted")
    }
}

#[async_trait]
impl ImageRecordClient for FakeClient {
    async fn fetch_image(&self, image: &ImageRef) -> Result<ImageRecord, ClientError> {
        match self.record.lock().unwrap().as_ref() {
            Some(record) if record.id == image.image_id => Ok(record.clone()),
            _ => Err(ClientError::NotFound),
        }
    }

    async fn update_image(
        &self,
        image: &ImageRef,
        update: &ImageUpdate,
    ) -> Result<ImageRecord, ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 503,
                body: "service unavailable".into(),
            });
        }
        let mut guard = self.record.lock().unwrap();
        let record = match guard.as_mut() {
            Some(record) if record.id == image.image_id => record,
            _ => return Err(ClientError::NotFound),
        };
        match update {
            ImageUpdate::SetDescription(text) => record.description = text.clone(),
            ImageUpdate::SetNotes(text) => record.notes = text.clone(),
            ImageUpdate::SetAnnotations(list) => record.annotations = list.clone(),
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(record.clone())
    }
}

/// A 400x300 image at natural size, anchored at the origin.
pub fn flat_frame() -> Frame {
    Frame::new(RenderedRect::new(0.0, 0.0, 400.0, 300.0))
}

/// Press and release on the image.
pub fn tap(editor: &mut Editor, frame: &Frame, press: (f64, f64), release: (f64, f64)) {
    editor.handle(
        GestureEvent::PointerDown {
            point: ScreenPoint::new(press.0, press.1),
            target: PointerTarget::Image,
        },
        frame,
    );
    editor.handle(
        GestureEvent::PointerUp(ScreenPoint::new(release.0, release.1)),
        frame,
    );
}

/// Drag the label `id` along `path`, starting at `from`.
pub fn drag(editor: &mut Editor, frame: &Frame, id: &str, from: (f64, f64), path: &[(f64, f64)]) {
    editor.handle(
        GestureEvent::PointerDown {
            point: ScreenPoint::new(from.0, from.1),
            target: PointerTarget::Label(id.to_string()),
        },
        frame,
    );
    let mut last = from;
    for &(x, y) in path {
        editor.handle(GestureEvent::PointerMove(ScreenPoint::new(x, y)), frame);
        last = (x, y);
    }
    editor.handle(GestureEvent::PointerUp(ScreenPoint::new(last.0, last.1)), frame);
}
