// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integration tests for the HTTP API.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt; // for .collect().await
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use ipp_monitor_app::AppServices;
use ipp_monitor_app::http::{router, serve};
use ipp_monitor_core::AppConfig;
use ipp_monitor_core::config::PrinterEntryConfig;
use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::types::{
    ConnectionConfig, DiscoveredQueue, EntryId, JobMetadata, PrinterState, PrinterStatus,
};
use ipp_monitor_print::client::PrinterClient;

const BOUNDARY: &str = "ipp-monitor-test-boundary";

/// Always idle; submissions succeed unless `fail_submit` is set.
#[derive(Default)]
struct StubPrinter {
    fail_submit: bool,
    submitted: Mutex<Vec<JobMetadata>>,
}

#[async_trait]
impl PrinterClient for StubPrinter {
    async fn fetch_status(&self, _: &ConnectionConfig) -> Result<PrinterStatus> {
        Ok(PrinterStatus::new(
            PrinterState::Idle,
            Some("Ready".into()),
            vec![],
        ))
    }

    async fn submit_job(&self, _: &ConnectionConfig, _: Vec<u8>, metadata: &JobMetadata) -> Result<()> {
        if self.fail_submit {
            return Err(MonitorError::Connection("connection refused".into()));
        }
        self.submitted.lock().unwrap().push(metadata.clone());
        Ok(())
    }

    async fn list_queues(&self, _: &ConnectionConfig) -> Result<Vec<DiscoveredQueue>> {
        Ok(vec![])
    }
}

struct TestApp {
    app: Router,
    services: AppServices,
    printer: Arc<StubPrinter>,
    entry_id: EntryId,
    _dir: tempfile::TempDir,
}

async fn test_app(printer: StubPrinter, api_token: Option<&str>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let entry_id = EntryId::new();
    let config = AppConfig {
        api_token: api_token.map(str::to_owned),
        printers: vec![PrinterEntryConfig {
            id: entry_id,
            name: "Office".into(),
            connection: ConnectionConfig::new("cups.local").for_queue("Office"),
            simulation_mode: false,
        }],
        ..AppConfig::default()
    };
    let printer = Arc::new(printer);
    let services = AppServices::start(config, Some(dir.path().join("config.json")), printer.clone())
        .await
        .unwrap();
    TestApp {
        app: router(services.clone()),
        services,
        printer,
        entry_id,
        _dir: dir,
    }
}

fn multipart_body(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ipp_printer_service/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(filename, content)))
        .unwrap()
}

fn print_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/services/ipp_printer_service/print_pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn upload(t: &TestApp, filename: &str) -> PathBuf {
    let response = t
        .app
        .clone()
        .oneshot(upload_request(filename, b"%PDF-1.4\n%%EOF\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    PathBuf::from(json["file_path"].as_str().unwrap())
}

#[tokio::test]
async fn upload_stores_pdf_in_scratch_dir() {
    let t = test_app(StubPrinter::default(), None).await;
    let path = upload(&t, "report.pdf").await;

    assert!(path.exists());
    assert_eq!(path.parent(), Some(t.services.upload_dir()));
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.ends_with("_report.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4\n%%EOF\n");
}

#[tokio::test]
async fn upload_rejects_non_pdf() {
    let t = test_app(StubPrinter::default(), None).await;
    let response = t
        .app
        .clone()
        .oneshot(upload_request("notes.txt", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("Only PDF files are allowed"));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let t = test_app(StubPrinter::default(), None).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/ipp_printer_service/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_then_print() {
    let t = test_app(StubPrinter::default(), None).await;
    let path = upload(&t, "a.pdf").await;

    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "sensor.office_status",
            "file_path": path,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["entity_id"], "sensor.office_status");
    assert!(!path.exists());

    let submitted = t.printer.submitted.lock().unwrap().clone();
    assert_eq!(submitted, vec![JobMetadata::pdf()]);

    let response = t
        .app
        .clone()
        .oneshot(get("/api/states/sensor.office_last_print_job"))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["state"], path.display().to_string());
    assert_eq!(json["attributes"]["status"], "success");
}

#[tokio::test]
async fn print_failure_is_bad_gateway_and_recorded() {
    let printer = StubPrinter {
        fail_submit: true,
        ..StubPrinter::default()
    };
    let t = test_app(printer, None).await;
    let path = upload(&t, "a.pdf").await;

    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "sensor.office_status",
            "file_path": path,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("Failed to print: "));
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
    assert!(!path.exists());

    let state = t
        .services
        .state(&"sensor.office_last_print_job".into())
        .unwrap();
    assert_eq!(state.attributes["status"], "failed");
}

#[tokio::test]
async fn print_requires_fields() {
    let t = test_app(StubPrinter::default(), None).await;

    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({ "file_path": "/tmp/a.pdf" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("Entity ID is required"));

    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({ "entity_id": "sensor.office_status" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn print_missing_file_is_not_found() {
    let t = test_app(StubPrinter::default(), None).await;
    let missing = t.services.upload_dir().join("missing.pdf");
    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "sensor.office_status",
            "file_path": missing,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(t.printer.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn print_refuses_files_outside_upload_dir() {
    let t = test_app(StubPrinter::default(), None).await;
    let elsewhere = tempfile::tempdir().unwrap();
    let victim = elsewhere.path().join("precious.txt");
    std::fs::write(&victim, b"keep me").unwrap();

    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "sensor.office_status",
            "file_path": victim,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read(&victim).unwrap(), b"keep me");
    assert!(t.printer.submitted.lock().unwrap().is_empty());

    let state = t
        .services
        .state(&"sensor.office_last_print_job".into())
        .unwrap();
    assert_eq!(state.state, "None");
}

#[tokio::test]
async fn truncated_upload_leaves_nothing_behind() {
    let t = test_app(StubPrinter::default(), None).await;
    let mut body = multipart_body("a.pdf", b"%PDF-1.4\n");
    body.truncate(body.len() - format!("\r\n--{BOUNDARY}--\r\n").len());
    let request = Request::builder()
        .method("POST")
        .uri("/api/ipp_printer_service/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let leftovers = std::fs::read_dir(t.services.upload_dir()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn open_api_only_serves_loopback() {
    let t = test_app(StubPrinter::default(), None).await;
    let result = serve(t.services.clone(), "0.0.0.0:0", std::future::pending()).await;
    assert!(matches!(result, Err(MonitorError::Config(_))));
}

#[tokio::test]
async fn print_unknown_entity_keeps_upload() {
    let t = test_app(StubPrinter::default(), None).await;
    let path = upload(&t, "a.pdf").await;
    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "light.kitchen",
            "file_path": path,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(path.exists());
}

#[tokio::test]
async fn simulation_option_skips_printer() {
    let t = test_app(StubPrinter::default(), None).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/entries/{}/options", t.entry_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "simulation_mode": true }).to_string()))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let path = upload(&t, "a.pdf").await;
    let response = t
        .app
        .clone()
        .oneshot(print_request(json!({
            "entity_id": "binary_sensor.office_simulation_mode",
            "file_path": path,
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "simulated");
    assert!(t.printer.submitted.lock().unwrap().is_empty());
    assert!(!path.exists());

    let response = t
        .app
        .clone()
        .oneshot(get("/api/states/binary_sensor.office_simulation_mode"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["state"], "on");
}

#[tokio::test]
async fn options_for_unknown_entry_is_not_found() {
    let t = test_app(StubPrinter::default(), None).await;
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/entries/{}/options", EntryId::new()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "simulation_mode": true }).to_string()))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn states_list_every_entity() {
    let t = test_app(StubPrinter::default(), None).await;
    let response = t.app.clone().oneshot(get("/api/states")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let states = json.as_array().unwrap();
    assert_eq!(states.len(), 3);
    let status = states
        .iter()
        .find(|s| s["entity_id"] == "sensor.office_status")
        .unwrap();
    assert_eq!(status["state"], "idle");
    assert_eq!(status["attributes"]["message"], "Ready");
    assert_eq!(status["available"], true);

    let response = t
        .app
        .clone()
        .oneshot(get("/api/states/sensor.nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entries_report_health() {
    let t = test_app(StubPrinter::default(), None).await;
    let response = t.app.clone().oneshot(get("/api/entries")).await.unwrap();
    let json = json_body(response).await;
    let entry = &json.as_array().unwrap()[0];
    assert_eq!(entry["title"], "Office");
    assert_eq!(entry["printer_uri"], "ipp://cups.local:631/printers/Office");
    assert_eq!(entry["health"]["last_update_success"], true);
    assert_eq!(entry["entities"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn token_is_enforced_when_configured() {
    let t = test_app(StubPrinter::default(), Some("s3cret")).await;

    let response = t.app.clone().oneshot(get("/api/states")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/states")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/states")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
