//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use chrono::NaiveDateTime;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::audit::AuditEntry;
use crate::notes::Note;

use super::CreateAuditEntryValues;
use super::CreateNoteValues;
use super::Error;
use super::NoteStats;
use super::Result;
use super::Storage;
use super::UpdateNoteValues;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All notes in storage, ordered by ID
    notes: Arc<Mutex<BTreeMap<i64, Note>>>,

    /// The complete audit trail, in order of recording
    audit_entries: Arc<Mutex<Vec<AuditEntry>>>,

    /// Last assigned note ID
    last_note_id: Arc<AtomicI64>,

    /// Last assigned audit entry ID
    last_audit_entry_id: Arc<AtomicI64>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

/// Current time, never before `previous`
///
/// The wall clock can jump back, timestamps of a single record may not
fn now_after(previous: NaiveDateTime) -> NaiveDateTime {
    Utc::now().naive_utc().max(previous)
}

/// A fresh, active note
fn new_note(id: i64, values: &CreateNoteValues<'_>) -> Note {
    let now = Utc::now().naive_utc();

    Note {
        id,
        title: values.title.to_string(),
        content: values.content.map(ToString::to_string),
        created_at: now,
        updated_at: now,
        is_deleted: false,
    }
}

/// Does the text contain the (lowercase) needle, ignoring case?
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Storage for Memory {
    const NAME: &'static str = "memory";

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_single_note_by_id(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.notes.lock().await.get(&id).cloned())
    }

    async fn find_all_active_notes(&self) -> Result<Vec<Note>> {
        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| note.is_active())
            .cloned()
            .collect::<Vec<Note>>();

        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(notes)
    }

    async fn search_active_notes(&self, needle: &str) -> Result<Vec<Note>> {
        let needle = needle.to_lowercase();

        let mut notes = self
            .notes
            .lock()
            .await
            .values()
            .filter(|note| {
                note.is_active()
                    && (contains_ignore_case(&note.title, &needle)
                        || note
                            .content
                            .as_deref()
                            .is_some_and(|content| contains_ignore_case(content, &needle)))
            })
            .cloned()
            .collect::<Vec<Note>>();

        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(notes)
    }

    async fn note_stats(&self) -> Result<NoteStats> {
        let notes = self.notes.lock().await;

        Ok(NoteStats {
            total: i64::try_from(notes.len()).map_err(|err| Error::InvalidData(err.to_string()))?,
            active: i64::try_from(notes.values().filter(|note| note.is_active()).count())
                .map_err(|err| Error::InvalidData(err.to_string()))?,
            first_id: notes.keys().next().copied(),
            last_id: notes.keys().next_back().copied(),
        })
    }

    async fn reserve_note_id(&self) -> Result<i64> {
        Ok(self.last_note_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn create_note(&self, id: i64, values: &CreateNoteValues<'_>) -> Result<Note> {
        let mut notes = self.notes.lock().await;

        if notes.contains_key(&id) {
            return Err(Error::InvalidData(format!("Note #{id} already exists")));
        }

        let note = new_note(id, values);

        notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn create_notes_if_empty(&self, values: &[CreateNoteValues<'_>]) -> Result<bool> {
        let mut notes = self.notes.lock().await;

        if !notes.is_empty() {
            return Ok(false);
        }

        for values in values {
            let note = new_note(self.reserve_note_id().await?, values);

            notes.insert(note.id, note);
        }

        Ok(true)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        self.notes
            .lock()
            .await
            .get_mut(&note.id)
            .map(|note| {
                if let Some(title) = values.title {
                    note.title = title.to_string();
                }

                if let Some(content) = values.content {
                    note.content = Some(content.to_string());
                }

                note.updated_at = now_after(note.updated_at);

                note.clone()
            })
            .ok_or_else(|| Error::InvalidData(format!("Note #{} vanished", note.id)))
    }

    async fn delete_note(&self, note: &Note) -> Result<Note> {
        self.notes
            .lock()
            .await
            .get_mut(&note.id)
            .map(|note| {
                note.is_deleted = true;
                note.updated_at = now_after(note.updated_at);

                note.clone()
            })
            .ok_or_else(|| Error::InvalidData(format!("Note #{} vanished", note.id)))
    }

    async fn purge_note(&self, note: &Note) -> Result<()> {
        // lock order: notes, then audit entries
        let mut notes = self.notes.lock().await;
        let mut audit_entries = self.audit_entries.lock().await;

        notes.remove(&note.id);

        for entry in audit_entries.iter_mut() {
            if entry.note_id == Some(note.id) {
                entry.note_id = None;
            }
        }

        Ok(())
    }

    async fn create_audit_entry(&self, values: &CreateAuditEntryValues<'_>) -> Result<AuditEntry> {
        let mut audit_entries = self.audit_entries.lock().await;

        let changed_at = audit_entries.last().map_or_else(
            || Utc::now().naive_utc(),
            |last| now_after(last.changed_at),
        );

        let entry = AuditEntry {
            id: self.last_audit_entry_id.fetch_add(1, Ordering::SeqCst) + 1,
            note_id: Some(values.note_id),
            action: values.action,
            old_title: values.old_title.map(ToString::to_string),
            new_title: values.new_title.map(ToString::to_string),
            changed_at,
        };

        audit_entries.push(entry.clone());

        Ok(entry)
    }

    async fn find_all_audit_entries_by_note(&self, note_id: i64) -> Result<Vec<AuditEntry>> {
        let mut entries = self
            .audit_entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.note_id == Some(note_id))
            .cloned()
            .collect::<Vec<AuditEntry>>();

        entries.sort_by(|a, b| a.changed_at.cmp(&b.changed_at).then(a.id.cmp(&b.id)));

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::AuditAction;

    use super::*;

    #[tokio::test]
    async fn test_purge_clears_note_of_audit_entries() {
        let storage = Memory::new();

        let note = storage
            .create_note(storage.reserve_note_id().await.unwrap(), &CreateNoteValues {
                title: "Welcome",
                content: None,
            })
            .await
            .unwrap();

        for action in [AuditAction::Create, AuditAction::Delete] {
            storage
                .create_audit_entry(&CreateAuditEntryValues {
                    note_id: note.id,
                    action,
                    old_title: None,
                    new_title: None,
                })
                .await
                .unwrap();
        }

        storage.purge_note(&note).await.unwrap();

        assert_eq!(None, storage.find_single_note_by_id(note.id).await.unwrap());

        let audit_entries = storage.audit_entries.lock().await;
        assert_eq!(2, audit_entries.len());
        assert!(audit_entries.iter().all(|entry| entry.note_id.is_none()));
    }

    #[tokio::test]
    async fn test_updated_at_never_moves_back() {
        let storage = Memory::new();

        let note = storage
            .create_note(storage.reserve_note_id().await.unwrap(), &CreateNoteValues {
                title: "Welcome",
                content: None,
            })
            .await
            .unwrap();

        let updated = storage
            .update_note(
                &note,
                &UpdateNoteValues {
                    title: None,
                    content: Some("hello"),
                },
            )
            .await
            .unwrap();
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(note.created_at, updated.created_at);

        let deleted = storage.delete_note(&updated).await.unwrap();
        assert!(deleted.updated_at >= updated.updated_at);
        assert!(deleted.is_deleted);

        let future = chrono::Utc::now().naive_utc() + chrono::Duration::days(1);
        assert_eq!(future, now_after(future));
    }

    #[tokio::test]
    async fn test_create_note_with_reserved_id() {
        let storage = Memory::new();

        let first = storage.reserve_note_id().await.unwrap();
        let second = storage.reserve_note_id().await.unwrap();
        assert_eq!((1, 2), (first, second));

        let values = CreateNoteValues {
            title: "Welcome",
            content: None,
        };

        // out of order is fine
        assert_eq!(second, storage.create_note(second, &values).await.unwrap().id);
        assert_eq!(first, storage.create_note(first, &values).await.unwrap().id);

        assert!(matches!(
            storage.create_note(first, &values).await,
            Err(Error::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_create_notes_if_empty() {
        let storage = Memory::new();

        let values = [
            CreateNoteValues {
                title: "One",
                content: None,
            },
            CreateNoteValues {
                title: "Two",
                content: Some("2"),
            },
        ];

        let (first, second) = tokio::join!(
            storage.create_notes_if_empty(&values),
            storage.create_notes_if_empty(&values),
        );
        assert!(first.unwrap() ^ second.unwrap());

        let stats = storage.note_stats().await.unwrap();
        assert_eq!(2, stats.total);
        assert_eq!(Some(1), stats.first_id);
        assert_eq!(Some(2), stats.last_id);

        assert!(!storage.create_notes_if_empty(&values).await.unwrap());
        assert_eq!(2, storage.note_stats().await.unwrap().total);
    }
}
