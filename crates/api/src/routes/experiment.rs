//! Route definitions for experiments and their images.

use axum::routing::get;
use axum::Router;

use crate::handlers::{experiment, image};
use crate::state::AppState;

/// Routes mounted at `/experiments`.
///
/// ```text
/// GET    /                          list (with catalog stats)
/// POST   /                          create
/// GET    /{num}                     get_by_number (with images)
/// PATCH  /{num}                     update name / description
/// DELETE /{num}                     delete (cascades to images)
/// GET    /{num}/upload-link         upload_link_for
///
/// GET    /{num}/images              list_by_experiment
/// POST   /{num}/images              upload (multipart)
/// GET    /{num}/images/{id}         get_by_id
/// PATCH  /{num}/images/{id}         update one field
/// DELETE /{num}/images/{id}         delete
/// ```
pub fn router() -> Router<AppState> {
    let image_routes = Router::new()
        .route("/", get(image::list_by_experiment).post(image::upload))
        .route(
            "/{id}",
            get(image::get_by_id)
                .patch(image::update)
                .delete(image::delete),
        );

    Router::new()
        .route("/", get(experiment::list).post(experiment::create))
        .route(
            "/{num}",
            get(experiment::get_by_number)
                .patch(experiment::update)
                .delete(experiment::delete),
        )
        .route("/{num}/upload-link", get(experiment::upload_link_for))
        .nest("/{num}/images", image_routes)
}
