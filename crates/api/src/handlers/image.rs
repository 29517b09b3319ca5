//! Handlers for the images of an experiment: listing, multipart upload,
//! single-field updates and deletion.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use labfolio_core::error::CoreError;
use labfolio_core::experiment::parse_experiment_number;
use labfolio_core::image_update::{ImageUpdate, MAX_DESCRIPTION_LENGTH};
use labfolio_core::types::{ExperimentNumber, ImageId};
use labfolio_core::upload::{is_image_mime, uploader_or_default};
use labfolio_db::models::image::NewImage;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// One file part of an upload form.
struct FilePart {
    original_name: String,
    mime_type: String,
    data: axum::body::Bytes,
}

/// Parse `{num}` and `{id}` path segments. An id that is not a UUID cannot
/// name a stored image, so it is reported as not found.
fn parse_image_path(raw_number: &str, raw_id: &str) -> AppResult<(ExperimentNumber, ImageId)> {
    let number = parse_experiment_number(raw_number)?;
    let id = raw_id
        .parse::<ImageId>()
        .map_err(|_| CoreError::not_found("Image", raw_id))?;
    Ok((number, id))
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /experiments/{num}/images
pub async fn list_by_experiment(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> AppResult<impl IntoResponse> {
    let number = parse_experiment_number(&raw)?;
    let images = state.store.list_images(number).await?;
    Ok(Json(DataResponse { data: images }))
}

/// POST /experiments/{num}/images
///
/// Accepts a multipart form with one or more `files` parts and optional
/// `description` and `uploadedBy` fields. Parts whose content type is not
/// `image/*` are skipped. The experiment is created when it does not exist.
pub async fn upload(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let number = parse_experiment_number(&raw)?;

    let mut files: Vec<FilePart> = Vec::new();
    let mut received_files = 0usize;
    let mut description = String::new();
    let mut uploaded_by: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" => {
                received_files += 1;
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field.content_type().unwrap_or("").to_string();
                let data = field.bytes().await?;
                if !is_image_mime(&mime_type) {
                    tracing::debug!(
                        original_name = %original_name,
                        mime_type = %mime_type,
                        "Skipping non-image upload part"
                    );
                    continue;
                }
                files.push(FilePart {
                    original_name,
                    mime_type,
                    data,
                });
            }
            "description" => description = field.text().await?,
            "uploadedBy" => uploaded_by = Some(field.text().await?),
            _ => {} // ignore unknown fields
        }
    }

    if received_files == 0 {
        return Err(AppError::BadRequest("No files provided".into()));
    }
    if files.is_empty() {
        return Err(AppError::BadRequest("No valid image files provided".into()));
    }
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description is {len} characters, maximum is {MAX_DESCRIPTION_LENGTH}"
        ))
        .into());
    }
    let uploaded_by = uploader_or_default(uploaded_by.as_deref());

    let mut created = Vec::with_capacity(files.len());
    for file in files {
        let size = file.data.len() as i64;
        let stored = state
            .uploads
            .store(number, &file.original_name, file.data)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

        let new_image = NewImage {
            filename: stored.filename.clone(),
            optimized: stored.optimized.clone(),
            thumbnail: stored.thumbnail.clone(),
            original_name: file.original_name,
            description: description.clone(),
            uploaded_by: uploaded_by.clone(),
            mime_type: file.mime_type,
            size,
        };
        let image = match state.store.add_image(number, new_image).await {
            Ok(image) => image,
            Err(e) => {
                // No record points at these files.
                state.uploads.remove_stored(&stored).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            experiment_number = number,
            image_id = %image.id,
            order = image.order,
            size,
            "Image uploaded"
        );
        created.push(image);
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /experiments/{num}/images/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((raw_number, raw_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (number, id) = parse_image_path(&raw_number, &raw_id)?;
    let image = state
        .store
        .get_image(number, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Image", id))?;
    Ok(Json(DataResponse { data: image }))
}

/// PATCH /experiments/{num}/images/{id}
///
/// Replaces exactly one of `description`, `notes` or `annotations` and
/// returns the full updated record. The other fields are never touched.
pub async fn update(
    State(state): State<AppState>,
    Path((raw_number, raw_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let (number, id) = parse_image_path(&raw_number, &raw_id)?;
    let update = ImageUpdate::from_json(&body)?;

    let image = state
        .store
        .apply_image_update(number, id, &update)
        .await?
        .ok_or_else(|| CoreError::not_found("Image", id))?;

    tracing::info!(
        experiment_number = number,
        image_id = %id,
        field = update.field_name(),
        "Image updated"
    );

    Ok(Json(DataResponse { data: image }))
}

/// DELETE /experiments/{num}/images/{id}
///
/// Removes the record, recomputes the experiment's image count and then
/// deletes the stored files best-effort.
pub async fn delete(
    State(state): State<AppState>,
    Path((raw_number, raw_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let (number, id) = parse_image_path(&raw_number, &raw_id)?;
    let removed = state
        .store
        .delete_image(number, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Image", id))?;

    state.uploads.remove_files(&removed).await;

    tracing::info!(experiment_number = number, image_id = %id, "Image deleted");

    Ok(StatusCode::NO_CONTENT)
}
