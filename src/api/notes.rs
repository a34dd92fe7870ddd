//! Notes API endpoints
//!
//! Everything related to the notes management

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::audit::AuditAction;
use crate::audit::AuditEntry;
use crate::notes::Note;
use crate::storage::Storage;
use crate::store::NoteStore;

use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Note response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,

    /// Title
    pub title: String,

    /// Content, if any
    pub content: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted?
    pub is_deleted: bool,
}

impl NoteResponse {
    /// Create a response from a [`Note`](Note)
    pub fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
            is_deleted: note.is_deleted,
        }
    }

    /// Create a response from multiple [`Note`](Note)s
    pub fn from_note_multiple(mut notes: Vec<Note>) -> Vec<Self> {
        notes.drain(..).map(Self::from_note).collect::<Vec<Self>>()
    }
}

/// List all active notes, newest first
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/api/notes
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 3, "title": "Shopping list" ... } ] }
/// ```
pub async fn list<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = store.list_recent().await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// Get a single note
///
/// Soft-deleted notes are returned as well, with `isDeleted` set
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/api/notes/1
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": 1, "title": "Welcome to Cloud Notes" ... } }
/// ```
pub async fn single<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<NoteResponse>, Error> {
    let note = store.get(note_id).await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Create note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    /// Title, 1 to 255 characters after trimming
    title: String,

    /// Optional content
    content: Option<String>,
}

/// Create a note
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "title": "Welcome", "content": "hello" }' \
///     http://localhost:5000/api/notes
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": 4, "title": "Welcome" ... } }
/// ```
pub async fn create<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let note = store.create(&form.title, form.content.as_deref()).await?;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Update note form
///
/// Fields that are left out are not changed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    /// New title
    title: Option<String>,

    /// New content
    content: Option<String>,
}

/// Update a note
///
/// Request:
/// ```sh
/// curl -v -X PUT -H 'Content-Type: application/json' \
///     -d '{ "title": "Welcome v2" }' \
///     http://localhost:5000/api/notes/4
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": 4, "title": "Welcome v2" ... } }
/// ```
pub async fn update<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    PathParameters(note_id): PathParameters<i64>,
    Form(form): Form<UpdateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let note = store
        .update(note_id, form.title.as_deref(), form.content.as_deref())
        .await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Soft-delete a note
///
/// Deleting a deleted note is fine
///
/// Request:
/// ```sh
/// curl -v -X DELETE http://localhost:5000/api/notes/4
/// ```
pub async fn delete<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<&'static str>, Error> {
    store.soft_delete(note_id).await?;

    Ok(Success::<&'static str>::no_content())
}

/// Audit entry response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    /// Entry ID
    pub id: i64,

    /// Note ID
    pub note_id: Option<i64>,

    /// What happened
    pub action: AuditAction,

    /// Title before
    pub old_title: Option<String>,

    /// Title after
    pub new_title: Option<String>,

    /// Recorded at
    pub changed_at: NaiveDateTime,
}

impl AuditEntryResponse {
    /// Create a response from an [`AuditEntry`](AuditEntry)
    fn from_audit_entry(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            note_id: entry.note_id,
            action: entry.action,
            old_title: entry.old_title,
            new_title: entry.new_title,
            changed_at: entry.changed_at,
        }
    }
}

/// The audit trail of a note, oldest first
///
/// Request:
/// ```sh
/// curl -v http://localhost:5000/api/notes/4/audit
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": 1, "action": "CREATE", "oldTitle": null, "newTitle": "Welcome" ... } ] }
/// ```
pub async fn audit_trail<S: Storage>(
    Extension(store): Extension<NoteStore<S>>,
    PathParameters(note_id): PathParameters<i64>,
) -> Result<Success<Vec<AuditEntryResponse>>, Error> {
    let entries = store.audit_trail(note_id).await?;

    Ok(Success::ok(
        entries
            .into_iter()
            .map(AuditEntryResponse::from_audit_entry)
            .collect(),
    ))
}
