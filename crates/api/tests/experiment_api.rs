//! HTTP-level integration tests for the experiment endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, build_test_app_with, delete, get, patch_json, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Create / list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_experiment_with_explicit_number() {
    let app = build_test_app();

    let response = post_json(
        app.router(),
        "/api/v1/experiments",
        json!({ "number": 4, "name": "  Rhizome sections ", "description": "Week 2" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["number"], 4);
    assert_eq!(json["data"]["name"], "Rhizome sections");
    assert_eq!(json["data"]["description"], "Week 2");
    assert_eq!(json["data"]["imageCount"], 0);
    assert!(json["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn create_experiment_auto_assigns_next_number() {
    let app = build_test_app();
    post_json(app.router(), "/api/v1/experiments", json!({ "number": 7, "name": "Seven" })).await;

    let response = post_json(app.router(), "/api/v1/experiments", json!({ "name": "Next" })).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["number"], 8);
}

#[tokio::test]
async fn create_duplicate_number_returns_409() {
    let app = build_test_app();
    post_json(app.router(), "/api/v1/experiments", json!({ "number": 2, "name": "A" })).await;

    let response =
        post_json(app.router(), "/api/v1/experiments", json!({ "number": 2, "name": "B" })).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn create_rejects_blank_name_and_zero_number() {
    let app = build_test_app();

    let blank = post_json(app.router(), "/api/v1/experiments", json!({ "name": "   " })).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let zero =
        post_json(app.router(), "/api/v1/experiments", json!({ "number": 0, "name": "Z" })).await;
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_returns_experiments_in_order_with_stats() {
    let app = build_test_app();
    post_json(app.router(), "/api/v1/experiments", json!({ "number": 3, "name": "C" })).await;
    post_json(app.router(), "/api/v1/experiments", json!({ "number": 1, "name": "A" })).await;
    common::upload_png(&app, 3, "stem.png").await;

    let response = get(app.router(), "/api/v1/experiments").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let numbers: Vec<i64> = json["data"]["experiments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, [1, 3]);
    assert_eq!(json["data"]["stats"]["totalExperiments"], 2);
    assert_eq!(json["data"]["stats"]["totalImages"], 1);
}

// ---------------------------------------------------------------------------
// Get / update / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_experiment_includes_ordered_images() {
    let app = build_test_app();
    common::upload_png(&app, 5, "first.png").await;
    common::upload_png(&app, 5, "second.png").await;

    let response = get(app.router(), "/api/v1/experiments/5").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["number"], 5);
    assert_eq!(json["data"]["name"], "Experiment 5");
    assert_eq!(json["data"]["imageCount"], 2);
    let images = json["data"]["images"].as_array().unwrap();
    assert_eq!(images[0]["originalName"], "first.png");
    assert_eq!(images[0]["order"], 1);
    assert_eq!(images[1]["order"], 2);
}

#[tokio::test]
async fn get_missing_experiment_returns_404() {
    let app = build_test_app();
    let response = get(app.router(), "/api/v1/experiments/99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_experiment_number_returns_400() {
    let app = build_test_app();
    let response = get(app.router(), "/api/v1/experiments/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_meta_changes_only_given_fields() {
    let app = build_test_app();
    post_json(
        app.router(),
        "/api/v1/experiments",
        json!({ "number": 1, "name": "Old", "description": "Keep me" }),
    )
    .await;

    let response =
        patch_json(app.router(), "/api/v1/experiments/1", json!({ "name": "Leaves" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Leaves");
    assert_eq!(json["data"]["description"], "Keep me");

    let missing = patch_json(app.router(), "/api/v1/experiments/9", json!({ "name": "X" })).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_experiment_removes_images_and_files() {
    let app = build_test_app();
    let image = common::upload_png(&app, 2, "root.png").await;
    let stored = app.upload_dir.join("2").join(
        image["filename"]
            .as_str()
            .unwrap()
            .rsplit('/')
            .next()
            .unwrap(),
    );
    assert!(stored.exists());

    let response = delete(app.router(), "/api/v1/experiments/2").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(!stored.exists());
    assert!(!app.upload_dir.join("2").exists());
    assert_eq!(
        get(app.router(), "/api/v1/experiments/2").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        delete(app.router(), "/api/v1/experiments/2").await.status(),
        StatusCode::NOT_FOUND
    );
}

// ---------------------------------------------------------------------------
// Upload link
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_link_uses_site_url_when_configured() {
    let app = build_test_app_with(|config| {
        config.site_url = Some("https://lab.example.org/".into());
    });

    let response = get(app.router(), "/api/v1/experiments/12/upload-link").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["uploadUrl"],
        "https://lab.example.org/upload/12"
    );
}

#[tokio::test]
async fn upload_link_falls_back_to_default_host() {
    let app = build_test_app();

    let response = get(app.router(), "/api/v1/experiments/3/upload-link").await;

    assert_eq!(
        body_json(response).await["data"]["uploadUrl"],
        "http://localhost:3000/upload/3"
    );
}
