use std::collections::HashSet;

use tokio::task::JoinSet;

use crate::audit::AuditAction;
use crate::storage::Memory;
use crate::store::Error;
use crate::store::NoteStore;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_keep_the_audit_trail_consistent() {
    let store = NoteStore::new(Memory::new());

    let note = store.create("Title 0", None).await.unwrap();
    let id = note.id;

    let mut tasks = JoinSet::new();

    for i in 1..=50 {
        let store = store.clone();

        tasks.spawn(async move {
            store
                .update(id, Some(format!("Title {i}").as_str()), None)
                .await
                .unwrap();
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let stored = store.get(note.id).await.unwrap();
    let entries = store.audit_trail(note.id).await.unwrap();

    assert_eq!(51, entries.len());
    assert_eq!(AuditAction::Create, entries[0].action);
    assert_eq!(Some(stored.title.clone()), entries[50].new_title);

    // every update starts where the previous one ended
    for pair in entries.windows(2) {
        assert_eq!(pair[0].new_title, pair[1].old_title);
        assert!(pair[0].changed_at <= pair[1].changed_at);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_ids() {
    let store = NoteStore::new(Memory::new());

    let mut tasks = JoinSet::new();

    for i in 0..50 {
        let store = store.clone();

        tasks.spawn(async move { store.create(&format!("Note {i}"), None).await.unwrap().id });
    }

    let mut ids = HashSet::new();

    while let Some(result) = tasks.join_next().await {
        assert!(ids.insert(result.unwrap()));
    }

    assert_eq!((1..=50).collect::<HashSet<i64>>(), ids);
    assert_eq!(50, store.count_active().await.unwrap());

    // exactly one create per note
    for id in ids {
        let entries = store.audit_trail(id).await.unwrap();
        assert_eq!(1, entries.len());
        assert_eq!(AuditAction::Create, entries[0].action);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_record_a_single_delete() {
    let store = NoteStore::new(Memory::new());

    let note = store.create("Welcome", None).await.unwrap();
    let id = note.id;

    let mut tasks = JoinSet::new();

    for _ in 0..20 {
        let store = store.clone();

        tasks.spawn(async move { store.soft_delete(id).await.unwrap() });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let deletes = store
        .audit_trail(note.id)
        .await
        .unwrap()
        .iter()
        .filter(|entry| entry.action == AuditAction::Delete)
        .count();

    assert_eq!(1, deletes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fresh_notes_start_with_their_create() {
    let store = NoteStore::new(Memory::new());

    let mut tasks = JoinSet::new();

    // hammer the IDs before they exist
    for id in 1..=20 {
        let store = store.clone();

        tasks.spawn(async move {
            loop {
                match store.update(id, Some("Updated"), None).await {
                    Ok(_) => break,
                    Err(Error::NotFound(_)) => tokio::task::yield_now().await,
                    Err(err) => panic!("Unexpected error: {err}"),
                }
            }
        });
    }

    for i in 1..=20 {
        let store = store.clone();

        tasks.spawn(async move {
            store.create(&format!("Note {i}"), None).await.unwrap();
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    for id in 1..=20 {
        let entries = store.audit_trail(id).await.unwrap();

        assert_eq!(2, entries.len());
        assert_eq!(AuditAction::Create, entries[0].action);
        assert_eq!(AuditAction::Update, entries[1].action);
        assert_eq!(entries[0].new_title, entries[1].old_title);
    }
}
