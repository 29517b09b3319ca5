use std::sync::Arc;

use labfolio_db::RecordStore;

use crate::config::ServerConfig;
use crate::storage::UploadStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`. Built once by the
/// binary (or the test harness) and never reached through globals.
#[derive(Clone)]
pub struct AppState {
    /// The record store engine selected at startup.
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<ServerConfig>,
    /// On-disk storage for uploaded originals and their variants.
    pub uploads: Arc<UploadStorage>,
}
