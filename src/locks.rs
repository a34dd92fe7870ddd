//! Per-note locks
//!
//! Serializes the mutations of a single note, mutations of different notes run side by side.
//! Only notes that are being mutated (or waited for) have a lock, the registry never grows with
//! the number of notes

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;

use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Locks per note ID
///
/// A plain mutex, it is never held across an `.await`
type Registry = std::sync::Mutex<HashMap<i64, Arc<Mutex<()>>>>;

/// Exclusive access to a single note
///
/// Released when dropped, the lock is removed from the registry when nobody else wants it
#[derive(Debug)]
pub struct NoteGuard {
    /// Note the guard is for
    note_id: i64,

    /// Keeps other mutations of the note out, `None` once dropped
    guard: Option<OwnedMutexGuard<()>>,

    /// Registry the lock came from
    registry: Arc<Registry>,
}

impl Drop for NoteGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);

        // waiters clone the lock while holding the registry, so they are counted here
        if locks
            .get(&self.note_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.note_id);
        }
    }
}

/// Registry of one lock per note ID
#[derive(Clone, Debug, Default)]
pub struct NoteLocks {
    /// Lock per note ID, created on first use
    registry: Arc<Registry>,
}

impl NoteLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a note
    pub async fn lock(&self, note_id: i64) -> NoteGuard {
        let lock = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(note_id)
            .or_default()
            .clone();

        NoteGuard {
            note_id,
            guard: Some(lock.lock_owned().await),
            registry: self.registry.clone(),
        }
    }
}
