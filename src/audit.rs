//! Audit trail of note mutations
//!
//! Recording is best effort: a failure to record is logged, never returned to the mutation that
//! triggered it

use chrono::naive::NaiveDateTime;
use serde::Serialize;

use crate::storage::CreateAuditEntryValues;
use crate::storage::Result;
use crate::storage::Storage;

/// Possible audit trail actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// Note is created
    Create,

    /// Note title is updated
    Update,

    /// Note is soft-deleted
    Delete,
}

impl AuditAction {
    /// Name of the action as it is stored
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single, immutable, entry on the audit trail
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    /// Entry ID
    pub id: i64,

    /// Weak reference to the note, `None` once the note is purged
    pub note_id: Option<i64>,

    /// What happened
    pub action: AuditAction,

    /// Title before the action, `None` on create
    pub old_title: Option<String>,

    /// Title after the action, `None` on delete
    pub new_title: Option<String>,

    /// Recorded at
    pub changed_at: NaiveDateTime,
}

/// Audit trail service
#[derive(Clone, Debug)]
pub struct AuditRecorder<S: Storage> {
    /// Storage in where the trail is saved
    storage: S,
}

impl<S: Storage> AuditRecorder<S> {
    /// Create a recorder saving to the storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Register an entry on the audit trail
    ///
    /// Any failure is logged and swallowed
    pub async fn record(
        &self,
        note_id: i64,
        action: AuditAction,
        old_title: Option<&str>,
        new_title: Option<&str>,
    ) {
        let values = CreateAuditEntryValues {
            note_id,
            action,
            old_title,
            new_title,
        };

        match self.storage.create_audit_entry(&values).await {
            Ok(entry) => {
                tracing::debug!("Recorded {action} of note #{note_id} as audit entry #{}", entry.id);
            }
            Err(err) => {
                tracing::error!("Could not record {action} of note #{note_id} on the audit trail: {err}");
            }
        }
    }

    /// All entries of a note, oldest first
    pub async fn list_for_note(&self, note_id: i64) -> Result<Vec<AuditEntry>> {
        self.storage.find_all_audit_entries_by_note(note_id).await
    }
}
