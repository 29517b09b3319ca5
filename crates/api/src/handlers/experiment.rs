//! Handlers for experiments: the catalog listing, creation, metadata edits,
//! cascade deletion and the phone upload link.

use axum::extract::{Path, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use labfolio_core::error::CoreError;
use labfolio_core::experiment::{normalize_name, parse_experiment_number, validate_experiment_number};
use labfolio_core::image_update::MAX_DESCRIPTION_LENGTH;
use labfolio_core::types::ExperimentNumber;
use labfolio_core::upload::upload_link;
use labfolio_db::models::experiment::{
    CatalogStats, CreateExperiment, Experiment, UpdateExperimentMeta,
};
use labfolio_db::models::image::ExperimentImage;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Response shapes
   -------------------------------------------------------------------------- */

/// Landing page payload.
#[derive(Debug, Serialize)]
pub struct ExperimentCatalog {
    pub experiments: Vec<Experiment>,
    pub stats: CatalogStats,
}

/// An experiment together with its ordered images.
#[derive(Debug, Serialize)]
pub struct ExperimentDetail {
    #[serde(flatten)]
    pub experiment: Experiment,
    pub images: Vec<ExperimentImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLink {
    pub upload_url: String,
}

/* --------------------------------------------------------------------------
   Helpers
   -------------------------------------------------------------------------- */

/// Load an experiment or fail with 404.
pub async fn ensure_experiment(state: &AppState, number: ExperimentNumber) -> AppResult<Experiment> {
    Ok(state
        .store
        .get_experiment(number)
        .await?
        .ok_or_else(|| CoreError::not_found("Experiment", number))?)
}

fn validate_description(description: &str) -> Result<(), CoreError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(CoreError::Validation(format!(
            "Description is {len} characters, maximum is {MAX_DESCRIPTION_LENGTH}"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /experiments
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let experiments = state.store.list_experiments().await?;
    let stats = state.store.stats().await?;
    Ok(Json(DataResponse {
        data: ExperimentCatalog { experiments, stats },
    }))
}

/// POST /experiments
///
/// Creates an experiment. The number is auto-assigned when omitted.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateExperiment>,
) -> AppResult<impl IntoResponse> {
    let name = normalize_name(&input.name)?;
    let description = input.description.unwrap_or_default();
    validate_description(&description)?;

    let number = match input.number {
        Some(number) => {
            validate_experiment_number(number)?;
            number
        }
        None => state.store.next_experiment_number().await?,
    };

    let experiment = state
        .store
        .create_experiment(number, &name, &description)
        .await?;

    tracing::info!(experiment_number = number, name = %experiment.name, "Experiment created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: experiment })))
}

/// GET /experiments/{num}
pub async fn get_by_number(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> AppResult<impl IntoResponse> {
    let number = parse_experiment_number(&raw)?;
    let experiment = ensure_experiment(&state, number).await?;
    let images = state.store.list_images(number).await?;
    Ok(Json(DataResponse {
        data: ExperimentDetail { experiment, images },
    }))
}

/// PATCH /experiments/{num}
///
/// Renames or re-describes an experiment. Absent fields are left as is.
pub async fn update(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(input): Json<UpdateExperimentMeta>,
) -> AppResult<impl IntoResponse> {
    let number = parse_experiment_number(&raw)?;
    let update = UpdateExperimentMeta {
        name: input.name.as_deref().map(normalize_name).transpose()?,
        description: input.description,
    };
    if let Some(description) = &update.description {
        validate_description(description)?;
    }

    let experiment = state
        .store
        .update_experiment_meta(number, &update)
        .await?
        .ok_or_else(|| CoreError::not_found("Experiment", number))?;

    tracing::info!(experiment_number = number, "Experiment metadata updated");

    Ok(Json(DataResponse { data: experiment }))
}

/// DELETE /experiments/{num}
///
/// Deletes the experiment and all of its images, then removes the backing
/// files best-effort.
pub async fn delete(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> AppResult<StatusCode> {
    let number = parse_experiment_number(&raw)?;
    let images = state
        .store
        .delete_experiment(number)
        .await?
        .ok_or_else(|| CoreError::not_found("Experiment", number))?;

    state.uploads.remove_experiment(number, &images).await;

    tracing::info!(
        experiment_number = number,
        image_count = images.len(),
        "Experiment deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /experiments/{num}/upload-link
///
/// The URL a phone opens to upload into this experiment. Uses `SITE_URL`
/// when configured, else the request's host and forwarded protocol.
pub async fn upload_link_for(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let number = parse_experiment_number(&raw)?;

    let base = match &state.config.site_url {
        Some(site) => site.clone(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("localhost:3000");
            let proto = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("http");
            format!("{proto}://{host}")
        }
    };

    Ok(Json(DataResponse {
        data: UploadLink {
            upload_url: upload_link(&base, number),
        },
    }))
}
