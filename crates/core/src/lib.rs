//! Domain types and validation rules shared by the record store, the HTTP
//! API and the annotation editor.
//!
//! Nothing in this crate performs I/O.

pub mod annotation;
pub mod error;
pub mod experiment;
pub mod image_update;
pub mod types;
pub mod upload;
