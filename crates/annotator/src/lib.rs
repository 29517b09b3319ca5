//! Annotation-editing core for a single image.
//!
//! Screen input goes through the gesture classifier, which drives the
//! coordinate mapper, the zoom/pan view state and the client-local
//! annotation store. Explicit saves go through the persistence bridge to the
//! record store over HTTP.

pub mod bridge;
pub mod client;
pub mod coords;
pub mod editor;
pub mod gesture;
pub mod store;
pub mod view;

pub use bridge::{BridgeError, FieldDraft, SaveStatus};
pub use client::{ClientError, HttpImageClient, ImageRecord, ImageRecordClient, ImageRef};
pub use editor::{Editor, Frame};
