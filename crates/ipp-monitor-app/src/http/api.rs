// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON API routes and handlers.
//
//   POST /api/ipp_printer_service/upload               multipart PDF upload
//   POST /api/services/ipp_printer_service/print_pdf   print an upload
//   GET  /api/states                                   all entity states
//   GET  /api/states/{entity_id}                       one entity state
//   GET  /api/entries                                  entries and poll health
//   POST /api/entries/{entry_id}/options               change entry options

use std::future::Future;
use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use ipp_monitor_core::error::{MonitorError, Result};
use ipp_monitor_core::human_errors::humanize_error;
use ipp_monitor_core::types::{EntityId, EntryId};
use ipp_monitor_print::health::PollHealth;

use crate::services::app_services::AppServices;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the router with every API endpoint.
pub fn router(services: AppServices) -> Router {
    Router::new()
        .route(
            "/api/ipp_printer_service/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/services/ipp_printer_service/print_pdf", post(print_pdf))
        .route("/api/states", get(list_states))
        .route("/api/states/{entity_id}", get(get_state))
        .route("/api/entries", get(list_entries))
        .route("/api/entries/{entry_id}/options", post(set_options))
        .layer(middleware::from_fn_with_state(services.clone(), require_token))
        .with_state(services)
}

/// Serve the API on `addr` until `shutdown` resolves.
///
/// Only a loopback address may be served without an API token.
pub async fn serve(
    services: AppServices,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| MonitorError::Server(format!("bind {addr}: {e}")))?;
    let local = listener.local_addr()?;
    if !local.ip().is_loopback() && services.api_token().is_none() {
        return Err(MonitorError::Config(format!(
            "refusing to listen on {local} without an api_token"
        )));
    }
    info!(addr = %local, "HTTP API listening");
    axum::serve(listener, router(services))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MonitorError::Server(e.to_string()))
}

// -- Error responses ---------------------------------------------------------

/// A `MonitorError` on its way out as a JSON response.
struct ApiError(MonitorError);

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        Self(e)
    }
}

fn status_for(err: &MonitorError) -> StatusCode {
    match err {
        MonitorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        MonitorError::FileNotFound(_)
        | MonitorError::EntityNotBound(_)
        | MonitorError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        MonitorError::PrintFailed { .. }
        | MonitorError::Connection(_)
        | MonitorError::Protocol(_)
        | MonitorError::NoPrintersFound => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let human = humanize_error(&self.0);
        let body = Json(json!({
            "error": self.0.to_string(),
            "message": human.message,
            "suggestion": human.suggestion,
            "retriable": human.retriable,
        }));
        (status, body).into_response()
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError(MonitorError::InvalidRequest(message.into()))
}

// -- Auth --------------------------------------------------------------------

/// Reject requests without the configured bearer token.  Open when no token
/// is configured.
async fn require_token(State(services): State<AppServices>, req: Request, next: Next) -> Response {
    if let Some(token) = services.api_token() {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(token.as_str()) {
            warn!(path = %req.uri().path(), "rejected request without valid token");
            let body = Json(json!({ "error": "missing or invalid bearer token" }));
            return (StatusCode::UNAUTHORIZED, body).into_response();
        }
    }
    next.run(req).await
}

// -- Upload ------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct UploadResponse {
    file_path: PathBuf,
}

/// Stream the first multipart field to a PDF in the upload directory.
async fn upload(
    State(services): State<AppServices>,
    mut multipart: Multipart,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    let mut field = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&e.body_text()))?
        .ok_or_else(|| bad_request("No file uploaded"))?;
    let filename = field
        .file_name()
        .map(str::to_owned)
        .ok_or_else(|| bad_request("No file uploaded"))?;

    let mut upload = services.begin_upload(&filename).await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| bad_request(&e.body_text()))?
    {
        upload.write(&chunk).await?;
    }
    let file_path = upload.finish().await?;
    Ok(Json(UploadResponse { file_path }))
}

// -- Print service -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PrintRequest {
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    file_path: Option<String>,
}

async fn print_pdf(
    State(services): State<AppServices>,
    Json(req): Json<PrintRequest>,
) -> std::result::Result<Response, ApiError> {
    let entity_id = req
        .entity_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("Entity ID is required"))?;
    let file_path = req
        .file_path
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("File path is required"))?;

    let record = services
        .print_pdf(&EntityId::new(entity_id), &PathBuf::from(file_path))
        .await?;
    Ok(Json(record).into_response())
}

// -- Entity states -----------------------------------------------------------

async fn list_states(State(services): State<AppServices>) -> Response {
    Json(services.states()).into_response()
}

async fn get_state(
    State(services): State<AppServices>,
    Path(entity_id): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let entity_id = EntityId::new(entity_id);
    services
        .state(&entity_id)
        .map(|state| Json(state).into_response())
        .ok_or_else(|| ApiError(MonitorError::EntityNotBound(entity_id.to_string())))
}

// -- Entries and options -----------------------------------------------------

#[derive(Debug, Serialize)]
struct EntrySummary {
    entry_id: EntryId,
    title: String,
    printer_uri: String,
    simulation_mode: bool,
    entities: Vec<EntityId>,
    health: PollHealth,
}

async fn list_entries(State(services): State<AppServices>) -> Response {
    let registry = services.registry();
    let entries: Vec<EntrySummary> = registry
        .entries()
        .iter()
        .map(|entry| EntrySummary {
            entry_id: entry.id,
            title: entry.title.clone(),
            printer_uri: entry.connection.printer_uri(),
            simulation_mode: entry.simulation_mode(),
            entities: registry.entities_of(entry.id),
            health: entry.coordinator.health(),
        })
        .collect();
    Json(entries).into_response()
}

#[derive(Debug, Deserialize)]
struct OptionsRequest {
    simulation_mode: bool,
}

async fn set_options(
    State(services): State<AppServices>,
    Path(entry_id): Path<String>,
    Json(req): Json<OptionsRequest>,
) -> std::result::Result<Response, ApiError> {
    let id: EntryId = entry_id
        .parse()
        .map_err(|_| ApiError(MonitorError::EntryNotFound(entry_id.clone())))?;
    services.set_simulation_mode(id, req.simulation_mode)?;
    Ok(Json(json!({
        "entry_id": id,
        "simulation_mode": req.simulation_mode,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_map_to_client_statuses() {
        assert_eq!(
            status_for(&MonitorError::FileNotFound(PathBuf::from("/tmp/a.pdf"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&MonitorError::EntityNotBound("E1".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&MonitorError::InvalidRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn printer_errors_map_to_bad_gateway() {
        let err = MonitorError::print_failed(MonitorError::Connection("refused".into()));
        assert_eq!(status_for(&err), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&MonitorError::Io(std::io::Error::other("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
