//! The root!
//!
//! Service information and health, outside of the API

use axum::Extension;
use axum::http::Uri;
use chrono::NaiveDateTime;
use chrono::Utc;
use serde::Serialize;

use crate::api::Error;
use crate::api::Success;
use crate::storage::Storage;
use crate::store::NoteStore;

/// Name of the service in responses
const SERVICE_NAME: &str = "cloud-notes";

/// Service information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexResponse {
    service: &'static str,
    version: &'static str,
    storage: &'static str,
    active_notes: Option<i64>,
    endpoints: [&'static str; 9],
}

/// Service information
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/
/// ```
pub async fn index<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
) -> Success<IndexResponse> {
    let active_notes = match store.count_active().await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!("Could not count the active notes: {err}");
            None
        }
    };

    Success::ok(IndexResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        storage: S::NAME,
        active_notes,
        endpoints: [
            "GET /health",
            "GET /api/notes",
            "POST /api/notes",
            "GET /api/notes/{id}",
            "PUT /api/notes/{id}",
            "DELETE /api/notes/{id}",
            "GET /api/notes/{id}/audit",
            "GET /api/stats",
            "GET /api/search?q={query}",
        ],
    })
}

/// Health of the service and its storage
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    storage: &'static str,
    storage_status: &'static str,
    timestamp: NaiveDateTime,
}

/// Health check
///
/// Always `200 OK`, a storage that can not be reached makes the status `degraded`
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/health
/// ```
pub async fn health<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
) -> Success<HealthResponse> {
    let (status, storage_status) = match store.ping().await {
        Ok(()) => ("healthy", "connected"),
        Err(err) => {
            tracing::warn!("Storage is not reachable: {err}");
            ("degraded", "disconnected")
        }
    };

    Success::ok(HealthResponse {
        status,
        service: SERVICE_NAME,
        storage: S::NAME,
        storage_status,
        timestamp: Utc::now().naive_utc(),
    })
}

/// Everything else
pub async fn not_found(uri: Uri) -> Error {
    tracing::debug!("No route for {}", uri.path());

    Error::not_found("Not found").with_description(uri.path())
}
