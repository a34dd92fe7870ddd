//! The note store
//!
//! Validates input, applies mutations to the storage and keeps the audit trail. All business
//! rules of notes live here, the API is a thin layer on top

use core::fmt;

use crate::audit::AuditAction;
use crate::audit::AuditEntry;
use crate::audit::AuditRecorder;
use crate::locks::NoteLocks;
use crate::notes::Note;
use crate::notes::normalize_text;
use crate::notes::parse_title;
use crate::storage;
use crate::storage::CreateNoteValues;
use crate::storage::NoteStats;
use crate::storage::Storage;
use crate::storage::UpdateNoteValues;

/// Note store errors
#[derive(Debug)]
pub enum Error {
    /// The input is not acceptable
    Validation(String),

    /// No note with this ID
    NotFound(i64),

    /// The storage failed
    Storage(storage::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(error) => write!(f, "{error}"),
            Error::NotFound(id) => write!(f, "Note #{id} not found"),
            Error::Storage(error) => write!(f, "Storage error: {error}"),
        }
    }
}

impl From<storage::Error> for Error {
    fn from(error: storage::Error) -> Self {
        Self::Storage(error)
    }
}

/// Result type for all note store operations
pub type Result<T> = core::result::Result<T, Error>;

/// Note store
///
/// Cheap to clone, all clones share the same notes
#[derive(Clone, Debug)]
pub struct NoteStore<S: Storage> {
    /// Storage of notes and audit trail
    storage: S,

    /// Audit trail of all mutations
    audit: AuditRecorder<S>,

    /// Serializes the mutations per note
    locks: NoteLocks,
}

impl<S: Storage> NoteStore<S> {
    /// Create a note store on top of a storage
    pub fn new(storage: S) -> Self {
        Self {
            audit: AuditRecorder::new(storage.clone()),
            storage,
            locks: NoteLocks::new(),
        }
    }

    /// Check if the underlying storage is reachable
    pub async fn ping(&self) -> Result<()> {
        Ok(self.storage.ping().await?)
    }

    /// Create a note
    ///
    /// Registers a `CREATE` on the audit trail. The ID is reserved and locked before the note
    /// exists, nobody can mutate the note before its `CREATE` is registered
    pub async fn create(&self, title: &str, content: Option<&str>) -> Result<Note> {
        let title = parse_title(title).map_err(|err| Error::Validation(err.to_string()))?;
        let content = content.map(normalize_text);

        let id = self.storage.reserve_note_id().await?;

        let _guard = self.locks.lock(id).await;

        let values = CreateNoteValues {
            title: &title,
            content: content.as_deref(),
        };

        let note = self.storage.create_note(id, &values).await?;

        tracing::info!("Note #{} created: {:?}", note.id, note.title);

        self.audit
            .record(note.id, AuditAction::Create, None, Some(&note.title))
            .await;

        Ok(note)
    }

    /// Get a single note
    ///
    /// Soft-deleted notes are found as well
    pub async fn get(&self, id: i64) -> Result<Note> {
        tracing::debug!("Looking for note #{id}");

        self.storage
            .find_single_note_by_id(id)
            .await?
            .ok_or(Error::NotFound(id))
    }

    /// Update the title and/or content of a note
    ///
    /// Registers an `UPDATE` on the audit trail when the title changed
    pub async fn update(&self, id: i64, title: Option<&str>, content: Option<&str>) -> Result<Note> {
        let title = title
            .map(parse_title)
            .transpose()
            .map_err(|err| Error::Validation(err.to_string()))?;
        let content = content.map(normalize_text);

        let _guard = self.locks.lock(id).await;

        let note = self.get(id).await?;

        if note.is_deleted {
            return Err(Error::Validation(format!(
                "Note #{id} is deleted, it can not be updated"
            )));
        }

        let values = UpdateNoteValues {
            title: title.as_deref(),
            content: content.as_deref(),
        };

        let updated_note = self.storage.update_note(&note, &values).await?;

        tracing::info!("Note #{id} updated");

        if note.title != updated_note.title {
            self.audit
                .record(
                    id,
                    AuditAction::Update,
                    Some(&note.title),
                    Some(&updated_note.title),
                )
                .await;
        }

        Ok(updated_note)
    }

    /// Soft-delete a note
    ///
    /// Deleting an already deleted note does nothing, only the first delete registers a
    /// `DELETE` on the audit trail
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        let _guard = self.locks.lock(id).await;

        let note = self.get(id).await?;

        if note.is_deleted {
            tracing::debug!("Note #{id} is already deleted");

            return Ok(());
        }

        self.storage.delete_note(&note).await?;

        tracing::info!("Note #{id} soft-deleted");

        self.audit
            .record(id, AuditAction::Delete, Some(&note.title), None)
            .await;

        Ok(())
    }

    /// Physically remove a note, administrative use only
    ///
    /// The audit trail of the note stays, without a reference to the note
    #[allow(dead_code)] // no API route on purpose
    pub async fn purge(&self, id: i64) -> Result<()> {
        let _guard = self.locks.lock(id).await;

        let note = self.get(id).await?;

        self.storage.purge_note(&note).await?;

        tracing::info!("Note #{id} purged");

        Ok(())
    }

    /// All active notes, oldest first
    pub async fn list_active(&self) -> Result<Vec<Note>> {
        Ok(self.storage.find_all_active_notes().await?)
    }

    /// All active notes, newest first
    pub async fn list_recent(&self) -> Result<Vec<Note>> {
        let mut notes = self.list_active().await?;

        notes.reverse();

        Ok(notes)
    }

    /// Number of active notes
    pub async fn count_active(&self) -> Result<i64> {
        Ok(self.stats().await?.active)
    }

    /// Counts over all notes
    pub async fn stats(&self) -> Result<NoteStats> {
        Ok(self.storage.note_stats().await?)
    }

    /// Active notes with the query in title or content, newest first
    ///
    /// The query is normalized the same way titles and content are
    pub async fn search(&self, query: &str) -> Result<Vec<Note>> {
        let query = normalize_text(query.trim());

        if query.is_empty() {
            return Err(Error::Validation("Search query can not be empty".to_string()));
        }

        let notes = self.storage.search_active_notes(&query).await?;

        tracing::debug!("Found {} notes for {query:?}", notes.len());

        Ok(notes)
    }

    /// The audit trail of a note, oldest first
    pub async fn audit_trail(&self, id: i64) -> Result<Vec<AuditEntry>> {
        let note = self.get(id).await?;

        Ok(self.audit.list_for_note(note.id).await?)
    }
}
