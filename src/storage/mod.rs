//! All things related to the storage of notes and their audit trail

use core::fmt;
use std::future::Future;

use sqlx::PgPool;

pub use memory::Memory;
pub use postgres::Postgres;

use crate::audit::AuditAction;
use crate::audit::AuditEntry;
use crate::notes::Note;
use crate::utils::env_var;

mod memory;
mod postgres;

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),

    /// The storage returned something that does not fit the model
    InvalidData(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
            Error::InvalidData(error) => write!(f, "Invalid data: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Storage configuration
pub enum Config {
    /// Keep everything in memory, gone on shutdown
    Memory,

    /// Connect to Postgres with a connection string
    DatabaseUrl(String),

    /// Use existing Postgres connection
    #[allow(dead_code)] // used by tests
    ExistingConnection(PgPool),
}

impl Config {
    /// Detect configuration from environment
    ///
    /// A non-empty `DATABASE_URL` selects Postgres, memory otherwise
    pub fn detect() -> Self {
        if let Some(database_url) = env_var("DATABASE_URL") {
            Self::DatabaseUrl(database_url)
        } else {
            tracing::info!("`DATABASE_URL` is not set, notes are kept in memory");

            Self::Memory
        }
    }
}

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// Title of the note, already parsed
    pub title: &'a str,

    /// Optional content of the note
    ///
    /// Can be anything
    pub content: Option<&'a str>,
}

/// Values to update a Note
///
/// Fields that are `None` are left alone
pub struct UpdateNoteValues<'a> {
    /// New title of the note, already parsed
    pub title: Option<&'a str>,

    /// New content of the note
    pub content: Option<&'a str>,
}

/// Values to append an entry to the audit trail
pub struct CreateAuditEntryValues<'a> {
    /// Note the action was applied to
    pub note_id: i64,

    /// What happened
    pub action: AuditAction,

    /// Title before the action
    pub old_title: Option<&'a str>,

    /// Title after the action
    pub new_title: Option<&'a str>,
}

/// Note counts over the whole storage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoteStats {
    /// All notes, soft-deleted included
    pub total: i64,

    /// Notes that are not soft-deleted
    pub active: i64,

    /// Lowest note ID
    pub first_id: Option<i64>,

    /// Highest note ID
    pub last_id: Option<i64>,
}

impl NoteStats {
    /// Soft-deleted notes
    pub fn deleted(&self) -> i64 {
        self.total - self.active
    }
}

/// Storage with all supported operations
///
/// Every single operation is atomic on its own, sequencing multiple operations is up to the
/// [`NoteStore`](crate::store::NoteStore)
pub trait Storage: Clone + Send + Sync + 'static {
    /// Name of the kind of storage, for humans
    const NAME: &'static str;

    /// Check if the storage is reachable
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// Find a single note by its ID
    ///
    /// DOES NOT respect the soft-delete
    fn find_single_note_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Note>>> + Send;

    /// Find all notes, oldest first
    ///
    /// Respects the soft-delete
    fn find_all_active_notes(&self) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Find all notes with the needle in title or content, newest first
    ///
    /// Case-insensitive, the needle is matched literally
    ///
    /// Respects the soft-delete
    fn search_active_notes(&self, needle: &str)
    -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Count all notes
    fn note_stats(&self) -> impl Future<Output = Result<NoteStats>> + Send;

    /// Hand out a fresh note ID, never handed out before
    ///
    /// Nobody can find a note under the ID until [`create_note`](Storage::create_note) is called
    /// with it, an ID that is never used leaves a gap
    fn reserve_note_id(&self) -> impl Future<Output = Result<i64>> + Send;

    /// Create a note with a reserved ID
    fn create_note(
        &self,
        id: i64,
        values: &CreateNoteValues<'_>,
    ) -> impl Future<Output = Result<Note>> + Send;

    /// Create all notes, in order, only when the storage has never held a note
    ///
    /// Checking and creating is a single step, returns if the notes were created
    fn create_notes_if_empty(
        &self,
        values: &[CreateNoteValues<'_>],
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Update a note and refresh its `updated_at`
    fn update_note(
        &self,
        note: &Note,
        values: &UpdateNoteValues<'_>,
    ) -> impl Future<Output = Result<Note>> + Send;

    /// Soft-delete a note and refresh its `updated_at`
    fn delete_note(&self, note: &Note) -> impl Future<Output = Result<Note>> + Send;

    /// Physically remove a note
    ///
    /// Audit entries of the note stay, their `note_id` is cleared
    fn purge_note(&self, note: &Note) -> impl Future<Output = Result<()>> + Send;

    /// Append an entry to the audit trail
    fn create_audit_entry(
        &self,
        values: &CreateAuditEntryValues<'_>,
    ) -> impl Future<Output = Result<AuditEntry>> + Send;

    /// Find all audit entries of a note, oldest first
    fn find_all_audit_entries_by_note(
        &self,
        note_id: i64,
    ) -> impl Future<Output = Result<Vec<AuditEntry>>> + Send;
}
