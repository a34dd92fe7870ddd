use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_notes() {
    let mut app = helper::setup_test_app().await;

    // sample notes, newest first
    let (status_code, notes) = helper::list_notes(&mut app).await;
    assert_eq!(StatusCode::OK, status_code);
    let notes = notes.unwrap();
    assert_eq!(
        vec!["Shopping list", "Getting started", "Welcome to Cloud Notes"],
        notes
            .iter()
            .map(|note| note.title.as_str())
            .collect::<Vec<&str>>()
    );

    // create note
    let (status_code, note, _) = helper::maybe_create_note(&mut app, "Welcome", Some("hello")).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let note = note.unwrap();
    assert_eq!(4, note.id);
    assert_eq!("Welcome".to_string(), note.title);
    assert_eq!(Some("hello".to_string()), note.content);
    assert_eq!(note.created_at, note.updated_at);
    assert!(!note.is_deleted);

    // verify note
    let (status_code, fetched, _) = helper::single_note(&mut app, note.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(&note), fetched.as_ref());

    // newest note comes first
    let (_, notes) = helper::list_notes(&mut app).await;
    let notes = notes.unwrap();
    assert_eq!(4, notes.len());
    assert_eq!(note.id, notes[0].id);

    // update title
    let (status_code, updated, _) =
        helper::maybe_update_note(&mut app, note.id, Some("Welcome v2"), None).await;
    assert_eq!(StatusCode::OK, status_code);
    let updated = updated.unwrap();
    assert_eq!("Welcome v2".to_string(), updated.title);
    assert_eq!(Some("hello".to_string()), updated.content);
    assert_eq!(note.created_at, updated.created_at);

    // update content only
    let (status_code, updated, _) =
        helper::maybe_update_note(&mut app, note.id, None, Some("hello again")).await;
    assert_eq!(StatusCode::OK, status_code);
    let updated = updated.unwrap();
    assert_eq!("Welcome v2".to_string(), updated.title);
    assert_eq!(Some("hello again".to_string()), updated.content);

    // audit trail, the content update is not in there
    let (status_code, entries) = helper::audit_trail(&mut app, note.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(
        vec![
            helper::AuditEntry {
                note_id: Some(note.id),
                action: "CREATE".to_string(),
                old_title: None,
                new_title: Some("Welcome".to_string()),
            },
            helper::AuditEntry {
                note_id: Some(note.id),
                action: "UPDATE".to_string(),
                old_title: Some("Welcome".to_string()),
                new_title: Some("Welcome v2".to_string()),
            },
        ],
        entries.unwrap()
    );

    // delete note
    let (status_code, _) = helper::maybe_delete_note(&mut app, note.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    // deleted note is gone from the list
    let (_, notes) = helper::list_notes(&mut app).await;
    assert!(!notes.unwrap().iter().any(|note_| note_.id == note.id));

    // but can still be fetched
    let (status_code, deleted, _) = helper::single_note(&mut app, note.id).await;
    assert_eq!(StatusCode::OK, status_code);
    let deleted = deleted.unwrap();
    assert!(deleted.is_deleted);
    assert_eq!("Welcome v2".to_string(), deleted.title);

    // delete again is fine
    let (status_code, _) = helper::maybe_delete_note(&mut app, note.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    // exactly one delete on the trail
    let (_, entries) = helper::audit_trail(&mut app, note.id).await;
    let entries = entries.unwrap();
    assert_eq!(3, entries.len());
    assert_eq!(
        helper::AuditEntry {
            note_id: Some(note.id),
            action: "DELETE".to_string(),
            old_title: Some("Welcome v2".to_string()),
            new_title: None,
        },
        entries[2]
    );

    // deleted notes can not be updated
    let (status_code, _, error) =
        helper::maybe_update_note(&mut app, note.id, Some("Welcome v3"), None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some(format!("Note #{} is deleted, it can not be updated", note.id)),
        error
    );
}

#[tokio::test]
async fn test_note_without_content() {
    let mut app = helper::setup_test_app().await;

    let (status_code, note, _) = helper::maybe_create_note(&mut app, "  Untitled  ", None).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let note = note.unwrap();
    assert_eq!("Untitled".to_string(), note.title);
    assert_eq!(None, note.content);
}

#[tokio::test]
async fn test_note_title_validation() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) = helper::maybe_create_note(&mut app, "", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Title can not be empty".to_string()), error);

    let (status_code, _, error) = helper::maybe_create_note(&mut app, "   ", None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Title can not be empty".to_string()), error);

    let title = "a".repeat(255);
    let (status_code, note, _) = helper::maybe_create_note(&mut app, &title, None).await;
    assert_eq!(StatusCode::CREATED, status_code);
    let note = note.unwrap();
    assert_eq!(title, note.title);

    let title = "a".repeat(256);
    let (status_code, _, error) = helper::maybe_create_note(&mut app, &title, None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        Some("Title can not be longer than 255 characters, got 256".to_string()),
        error
    );

    // same rules on update
    let (status_code, _, error) = helper::maybe_update_note(&mut app, note.id, Some(""), None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Title can not be empty".to_string()), error);

    let (status_code, _, _) =
        helper::maybe_update_note(&mut app, note.id, Some("b".repeat(256).as_str()), None).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);

    // failed updates leave the note alone
    let (_, fetched, _) = helper::single_note(&mut app, note.id).await;
    assert_eq!(Some(note), fetched);
}

#[tokio::test]
async fn test_unknown_note() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) = helper::single_note(&mut app, 1234).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);

    let (status_code, _, error) =
        helper::maybe_update_note(&mut app, 1234, Some("Nope"), None).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);

    let (status_code, error) = helper::maybe_delete_note(&mut app, 1234).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);

    let (status_code, _) = helper::audit_trail(&mut app, 1234).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}

#[tokio::test]
async fn test_invalid_note_id() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) = helper::single_note_with_str(&mut app, "abc").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Invalid path parameter".to_string()), error);
}

#[tokio::test]
async fn test_sample_notes_have_no_audit_trail() {
    let mut app = helper::setup_test_app().await;

    let (status_code, entries) = helper::audit_trail(&mut app, 1).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(Vec::new()), entries);
}

#[tokio::test]
async fn test_stats() {
    let mut app = helper::setup_test_app().await;

    let (_, note, _) = helper::maybe_create_note(&mut app, "Temporary", None).await;
    let note = note.unwrap();

    let (status_code, _) = helper::maybe_delete_note(&mut app, note.id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, body) = helper::get(&mut app, "/api/stats").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(
        serde_json::json!({
            "data": {
                "totalNotes": 4,
                "activeNotes": 3,
                "deletedNotes": 1,
                "firstNoteId": 1,
                "lastNoteId": 4,
            }
        }),
        body
    );
}
