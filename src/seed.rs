//! Sample notes for a fresh installation

use crate::storage::CreateNoteValues;
use crate::storage::Result;
use crate::storage::Storage;

/// Title and content of the sample notes, in order of creation
const SAMPLE_NOTES: [(&str, &str); 3] = [
    (
        "Welcome to Cloud Notes",
        "This is your first note. Edit it, delete it or create a new one.",
    ),
    (
        "Getting started",
        "Notes are listed newest first, deleted notes stay available for the audit trail.",
    ),
    (
        "Shopping list",
        "Milk, bread, coffee beans",
    ),
];

/// Insert the sample notes when the storage has no notes
///
/// Goes straight to the storage: the samples have no audit trail. Safe when more instances start
/// at the same time, only one of them inserts
pub async fn ensure_sample_notes<S: Storage>(storage: &S) -> Result<()> {
    let values = SAMPLE_NOTES.map(|(title, content)| CreateNoteValues {
        title,
        content: Some(content),
    });

    if storage.create_notes_if_empty(&values).await? {
        tracing::info!("Inserted {} sample notes", values.len());
    }

    Ok(())
}
