pub mod experiment;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /experiments                                     list, create
/// /experiments/{num}                               get, update meta, delete
/// /experiments/{num}/upload-link                   phone upload URL
/// /experiments/{num}/images                        list, upload (multipart)
/// /experiments/{num}/images/{id}                   get, update one field, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/experiments", experiment::router())
}
