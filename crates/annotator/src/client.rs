//! HTTP client for the record store's image endpoints.
//!
//! Talks to `GET` / `PATCH /api/v1/experiments/{num}/images/{id}` using
//! [`reqwest`] and unwraps the `{ "data": ... }` envelope.

use async_trait::async_trait;
use labfolio_core::annotation::Annotation;
use labfolio_core::image_update::ImageUpdate;
use labfolio_core::types::{ExperimentNumber, ImageId, Timestamp};
use serde::Deserialize;

/// Addresses one image within its experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub experiment_number: ExperimentNumber,
    pub image_id: ImageId,
}

/// An image record as returned by the record store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: ImageId,
    pub experiment_number: ExperimentNumber,
    pub filename: String,
    #[serde(default)]
    pub optimized: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub original_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub order: i64,
    pub uploaded_by: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: Timestamp,
}

impl ImageRecord {
    /// Path of the variant to display in the editor, falling back to the
    /// original upload.
    pub fn display_path(&self) -> &str {
        self.optimized.as_deref().unwrap_or(&self.filename)
    }
}

/// Errors from the record store client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The image or its experiment no longer exists.
    #[error("Image not found")]
    NotFound,

    /// Any other non-2xx response.
    #[error("Record store error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Read and single-field write access to image records.
#[async_trait]
pub trait ImageRecordClient: Send + Sync {
    async fn fetch_image(&self, image: &ImageRef) -> Result<ImageRecord, ClientError>;

    /// Apply one field update and return the full updated record.
    async fn update_image(
        &self,
        image: &ImageRef,
        update: &ImageUpdate,
    ) -> Result<ImageRecord, ClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// [`ImageRecordClient`] over HTTP.
pub struct HttpImageClient {
    client: reqwest::Client,
    api_url: String,
}

impl HttpImageClient {
    /// * `api_url` - Base URL of the server, e.g. `http://localhost:3000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn image_url(&self, image: &ImageRef) -> String {
        format!(
            "{}/api/v1/experiments/{}/images/{}",
            self.api_url, image.experiment_number, image.image_id
        )
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_record(response: reqwest::Response) -> Result<ImageRecord, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<ImageRecord>>().await?.data)
    }
}

#[async_trait]
impl ImageRecordClient for HttpImageClient {
    async fn fetch_image(&self, image: &ImageRef) -> Result<ImageRecord, ClientError> {
        let response = self.client.get(self.image_url(image)).send().await?;
        Self::parse_record(response).await
    }

    async fn update_image(
        &self,
        image: &ImageRef,
        update: &ImageUpdate,
    ) -> Result<ImageRecord, ClientError> {
        let response = self
            .client
            .patch(self.image_url(image))
            .json(update)
            .send()
            .await?;
        Self::parse_record(response).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn image_url_trims_trailing_slash() {
        let client = HttpImageClient::new("http://lab.local:3000/");
        let id = Uuid::nil();
        let url = client.image_url(&ImageRef {
            experiment_number: 4,
            image_id: id,
        });
        assert_eq!(url, format!("http://lab.local:3000/api/v1/experiments/4/images/{id}"));
    }

    #[test]
    fn record_defaults_missing_notes_and_annotations() {
        let body = json!({
            "data": {
                "id": Uuid::nil(),
                "experimentNumber": 1,
                "filename": "/uploads/1/a.png",
                "originalName": "a.png",
                "order": 1,
                "uploadedBy": "Anonymous",
                "mimeType": "image/png",
                "size": 10,
                "createdAt": "2026-01-05T10:00:00Z"
            }
        });

        let record = serde_json::from_value::<Envelope<ImageRecord>>(body).unwrap().data;

        assert_eq!(record.notes, "");
        assert!(record.annotations.is_empty());
        assert_eq!(record.display_path(), "/uploads/1/a.png");
    }

    #[test]
    fn patch_body_has_single_field() {
        let update = ImageUpdate::SetNotes("Stained".into());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "notes": "Stained" }));
    }
}
