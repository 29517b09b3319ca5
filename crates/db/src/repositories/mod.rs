//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod experiment_repo;
pub mod image_repo;

pub use experiment_repo::ExperimentRepo;
pub use image_repo::ImageRepo;
