//! End-to-end tests against a live listener

use api::{build_state, create_router, install_metrics, run_server, Settings};
use serde_json::{json, Value};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn fixture_base() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_settings(base: PathBuf) -> Settings {
    let mut settings = Settings::default();
    settings.artifacts.base_dir = base;
    settings.server.addr = "127.0.0.1:0".to_string();
    settings.metrics.enabled = false;
    settings
}

async fn spawn(settings: &Settings, with_metrics: bool) -> SocketAddr {
    let mut state = build_state(settings).expect("fixture artifacts load");
    if with_metrics {
        state = state.with_metrics(install_metrics().expect("recorder installs once"));
    }
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn example() -> Value {
    json!({
        "Sex": "M",
        "Length": 0.455,
        "Diameter": 0.365,
        "Height": 0.095,
        "Whole weight": 0.5140,
        "Shucked weight": 0.2245,
        "Viscera weight": 0.1010,
        "Shell weight": 0.150
    })
}

async fn post(addr: SocketAddr, body: String) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{}/predict", addr))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_always_ok() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "message": "API is running."}));
}

#[tokio::test]
async fn documented_example_predicts_fixture_value() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let response = post(addr, example().to_string()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"prediction": 8}));
}

#[tokio::test]
async fn key_order_does_not_change_prediction() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;

    let canonical = post(addr, example().to_string()).await.json::<Value>().await.unwrap();
    let reversed = r#"{"Shell weight":0.150,"Viscera weight":0.1010,"Shucked weight":0.2245,
        "Whole weight":0.5140,"Height":0.095,"Diameter":0.365,"Length":0.455,"Sex":"M"}"#;
    let shuffled = post(addr, reversed.to_string()).await.json::<Value>().await.unwrap();

    assert_eq!(canonical, shuffled);
}

#[tokio::test]
async fn non_positive_measurements_rejected() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;

    for field in ["Length", "Diameter", "Height", "Whole weight", "Shell weight"] {
        for bad in [0.0, -0.1] {
            let mut body = example();
            body[field] = json!(bad);
            let response = post(addr, body.to_string()).await;
            assert_eq!(response.status(), 422, "{} = {}", field, bad);
        }
    }
}

#[tokio::test]
async fn unknown_sex_rejected() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let mut body = example();
    body["Sex"] = json!("U");

    let response = post(addr, body.to_string()).await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"][0].as_str().unwrap().contains("Sex"));
}

#[tokio::test]
async fn missing_fields_listed() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let response = post(addr, json!({"Sex": "F", "Length": 0.5}).to_string()).await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn wrong_field_type_rejected() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let mut body = example();
    body["Height"] = json!("tall");

    let response = post(addr, body.to_string()).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn numeric_strings_are_coerced() {
    let addr = spawn(&fixture_settings(fixture_base()), false).await;
    let mut body = example();
    body["Length"] = json!("0.455");
    body["Shell weight"] = json!("0.150");

    let response = post(addr, body.to_string()).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"prediction": 8}));
}

#[tokio::test]
async fn metrics_count_predictions() {
    let addr = spawn(&fixture_settings(fixture_base()), true).await;
    assert_eq!(post(addr, example().to_string()).await.status(), 200);

    let text = reqwest::get(format!("http://{}/metrics", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("abalone_predictions_total"));
}

#[tokio::test]
async fn corrupted_artifact_prevents_startup() {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("models");
    fs::create_dir_all(&models).unwrap();
    for name in ["features.json", "encoder.json", "scaler.json"] {
        fs::copy(fixture_base().join("models").join(name), models.join(name)).unwrap();
    }
    fs::write(models.join("model.json"), b"\x00\x01 truncated").unwrap();

    let settings = fixture_settings(dir.path().to_path_buf());
    assert!(build_state(&settings).is_err());

    let err = run_server(&settings).await.unwrap_err();
    assert!(format!("{:#}", err).contains("model"));
}

#[tokio::test]
async fn missing_artifacts_prevent_startup() {
    let settings = fixture_settings(PathBuf::from("/nonexistent/abalone"));
    assert!(run_server(&settings).await.is_err());
}
