#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use labfolio_api::config::{LogFormat, ServerConfig, StoreBackend};
use labfolio_api::router::build_app_router;
use labfolio_api::state::AppState;
use labfolio_api::storage::UploadStorage;
use labfolio_db::{MemoryRecordStore, RecordStore};

/// A router over a fresh in-memory store and a temporary upload directory.
///
/// The temporary directory is removed when the `TestApp` is dropped.
pub struct TestApp {
    router: Router,
    pub store: Arc<dyn RecordStore>,
    pub upload_dir: PathBuf,
    _uploads: TempDir,
}

impl TestApp {
    /// A clone of the router, ready for one `oneshot` call.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".parse().unwrap()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        upload_dir,
        max_upload_bytes: 1024 * 1024,
        site_url: None,
        log_format: LogFormat::Pretty,
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app() -> TestApp {
    build_test_app_with(|_| {})
}

/// Like [`build_test_app`], with a hook to adjust the configuration.
pub fn build_test_app_with(adjust: impl FnOnce(&mut ServerConfig)) -> TestApp {
    assemble(Arc::new(MemoryRecordStore::new()), adjust)
}

/// Like [`build_test_app`], over a caller-supplied record store.
pub fn build_test_app_with_store(store: Arc<dyn RecordStore>) -> TestApp {
    assemble(store, |_| {})
}

fn assemble(store: Arc<dyn RecordStore>, adjust: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let upload_dir = uploads.path().to_path_buf();
    let mut config = test_config(upload_dir.clone());
    adjust(&mut config);

    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config),
        uploads: Arc::new(UploadStorage::new(&upload_dir)),
    };

    TestApp {
        router: build_app_router(state),
        store,
        upload_dir,
        _uploads: uploads,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let body = Body::from(json.to_string());
    send(app, Method::POST, uri, body, Some("application/json")).await
}

pub async fn patch_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let body = Body::from(json.to_string());
    send(app, Method::PATCH, uri, body, Some("application/json")).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Multipart helpers
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "labfolio-test-boundary";

/// One part of a multipart form.
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

/// POST a `multipart/form-data` body built from `parts`.
pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    send(app, Method::POST, uri, Body::from(body), Some(content_type.as_str())).await
}

/// A solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 120, 60]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Upload one PNG to an experiment and return the created record's JSON.
pub async fn upload_png(app: &TestApp, number: i64, filename: &str) -> serde_json::Value {
    let png = png_bytes(64, 48);
    let response = post_multipart(
        app.router(),
        &format!("/api/v1/experiments/{number}/images"),
        &[Part::File {
            name: "files",
            filename,
            content_type: "image/png",
            data: &png,
        }],
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"][0].clone()
}
