//! Statistics and search endpoints

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::storage::Storage;
use crate::store::NoteStore;

use super::Error;
use super::QueryParameters;
use super::Success;
use super::notes::NoteResponse;

/// Counts over all notes
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    total_notes: i64,
    active_notes: i64,
    deleted_notes: i64,
    first_note_id: Option<i64>,
    last_note_id: Option<i64>,
}

/// Note statistics
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/api/stats
/// ```
///
/// Response:
/// ```json
/// { "data": { "totalNotes": 3, "activeNotes": 2, "deletedNotes": 1 ... } }
/// ```
pub async fn stats<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
) -> Result<Success<StatsResponse>, Error> {
    let stats = store.stats().await?;

    Ok(Success::ok(StatsResponse {
        total_notes: stats.total,
        active_notes: stats.active,
        deleted_notes: stats.deleted(),
        first_note_id: stats.first_id,
        last_note_id: stats.last_id,
    }))
}

/// Search query string
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Text to look for in title or content
    #[serde(default)]
    q: String,
}

/// Search the active notes, newest first
///
/// Request:
/// ```sh
/// curl -v 'http://localhost:5000/api/search?q=shopping'
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 3, "title": "Shopping list" ... } ] }
/// ```
pub async fn search<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    QueryParameters(query): QueryParameters<SearchQuery>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = store.search(&query.q).await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}
