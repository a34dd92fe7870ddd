//! Postgres storage

use std::time::Duration;

use chrono::NaiveDateTime;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::audit::AuditAction;
use crate::audit::AuditEntry;
use crate::notes::Note;

use super::CreateAuditEntryValues;
use super::CreateNoteValues;
use super::Error;
use super::NoteStats;
use super::Result;
use super::Storage;
use super::UpdateNoteValues;

/// Schema to provision on startup, safe to run more than once
static SCHEMA: &str = include_str!("schema.sql");

/// Postgres type for audit trail action
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "audit_action")]
#[sqlx(rename_all = "UPPERCASE")]
enum AuditActionType {
    /// Note is created
    Create,

    /// Note title is updated
    Update,

    /// Note is soft-deleted
    Delete,
}

impl AuditActionType {
    /// Create audit action type from audit action
    fn from_action(action: AuditAction) -> Self {
        match action {
            AuditAction::Create => Self::Create,
            AuditAction::Update => Self::Update,
            AuditAction::Delete => Self::Delete,
        }
    }

    /// Create audit action from audit action type
    fn to_action(&self) -> AuditAction {
        match self {
            Self::Create => AuditAction::Create,
            Self::Update => AuditAction::Update,
            Self::Delete => AuditAction::Delete,
        }
    }
}

/// Postgres version of an audit entry
#[derive(sqlx::FromRow)]
struct PostgresAuditEntry {
    /// Entry ID
    id: i64,

    /// Note ID, nulled when the note is purged
    note_id: Option<i64>,

    /// Action type
    action: AuditActionType,

    /// Title before
    old_title: Option<String>,

    /// Title after
    new_title: Option<String>,

    /// Recorded at
    changed_at: NaiveDateTime,
}

impl AuditEntry {
    /// Create audit entry from postgres version
    fn from_postgres_audit_entry(entry: PostgresAuditEntry) -> Self {
        Self {
            id: entry.id,
            note_id: entry.note_id,
            action: entry.action.to_action(),
            old_title: entry.old_title,
            new_title: entry.new_title,
            changed_at: entry.changed_at,
        }
    }

    /// Create multiple audit entries from postgres version
    fn from_postgres_audit_entry_multiple(mut entries: Vec<PostgresAuditEntry>) -> Vec<Self> {
        entries
            .drain(..)
            .map(Self::from_postgres_audit_entry)
            .collect::<Vec<Self>>()
    }
}

/// Postgres version of the note counts
#[derive(sqlx::FromRow)]
struct PostgresNoteStats {
    /// All notes
    total: i64,

    /// Active notes
    active: i64,

    /// Lowest ID
    first_id: Option<i64>,

    /// Highest ID
    last_id: Option<i64>,
}

/// Postgres storage
#[derive(Clone, Debug)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage from a connection string
    ///
    /// The schema will be provisioned
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// The schema will be provisioned
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA)
            .execute(&connection_pool)
            .await
            .map_err(connection_error)?;

        tracing::debug!("Database schema is provisioned");

        Ok(Self { connection_pool })
    }
}

/// Escape the `LIKE` wildcards so the needle is matched literally
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());

    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }

        escaped.push(ch);
    }

    escaped
}

impl Storage for Postgres {
    const NAME: &'static str = "postgres";

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn find_single_note_by_id(&self, id: i64) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn find_all_active_notes(&self) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE is_deleted = FALSE
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn search_active_notes(&self, needle: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r"
            SELECT *
            FROM notes
            WHERE is_deleted = FALSE
                AND (title ILIKE $1 ESCAPE '\' OR content ILIKE $1 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(format!("%{}%", escape_like(needle)))
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(notes)
    }

    async fn note_stats(&self) -> Result<NoteStats> {
        let stats = sqlx::query_as::<_, PostgresNoteStats>(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_deleted = FALSE) AS active,
                MIN(id) AS first_id,
                MAX(id) AS last_id
            FROM notes
            ",
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(NoteStats {
            total: stats.total,
            active: stats.active,
            first_id: stats.first_id,
            last_id: stats.last_id,
        })
    }

    async fn reserve_note_id(&self) -> Result<i64> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            r"
            SELECT nextval(pg_get_serial_sequence('notes', 'id'))
            ",
        )
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(id)
    }

    async fn create_note(&self, id: i64, values: &CreateNoteValues<'_>) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r"
            INSERT INTO notes (id, title, content)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(id)
        .bind(values.title)
        .bind(values.content)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(note)
    }

    async fn create_notes_if_empty(&self, values: &[CreateNoteValues<'_>]) -> Result<bool> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        // conflicts with itself, a second instance waits until the first one is done
        sqlx::query("LOCK TABLE notes IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;

        let (has_notes,) =
            sqlx::query_as::<_, (bool,)>("SELECT EXISTS (SELECT 1 FROM notes)")
                .fetch_one(&mut *transaction)
                .await
                .map_err(connection_error)?;

        if has_notes {
            transaction.rollback().await.map_err(connection_error)?;

            return Ok(false);
        }

        for values in values {
            sqlx::query(
                r"
                INSERT INTO notes (title, content)
                VALUES ($1, $2)
                ",
            )
            .bind(values.title)
            .bind(values.content)
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;
        }

        transaction.commit().await.map_err(connection_error)?;

        Ok(true)
    }

    async fn update_note(&self, note: &Note, values: &UpdateNoteValues<'_>) -> Result<Note> {
        let updated_note = sqlx::query_as::<_, Note>(
            r"
            UPDATE notes
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = GREATEST(timezone('utc', now()), updated_at)
            WHERE id = $3
            RETURNING *
            ",
        )
        .bind(values.title)
        .bind(values.content)
        .bind(note.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(updated_note)
    }

    async fn delete_note(&self, note: &Note) -> Result<Note> {
        let deleted_note = sqlx::query_as::<_, Note>(
            r"
            UPDATE notes
            SET is_deleted = TRUE, updated_at = GREATEST(timezone('utc', now()), updated_at)
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(note.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(deleted_note)
    }

    async fn purge_note(&self, note: &Note) -> Result<()> {
        // `ON DELETE SET NULL` keeps the audit trail
        sqlx::query(
            r"
            DELETE FROM notes
            WHERE id = $1
            ",
        )
        .bind(note.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn create_audit_entry(&self, values: &CreateAuditEntryValues<'_>) -> Result<AuditEntry> {
        let entry = sqlx::query_as::<_, PostgresAuditEntry>(
            r"
            INSERT INTO audit_log (note_id, action, old_title, new_title)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(values.note_id)
        .bind(AuditActionType::from_action(values.action))
        .bind(values.old_title)
        .bind(values.new_title)
        .fetch_one(&self.connection_pool)
        .await
        .map(AuditEntry::from_postgres_audit_entry)
        .map_err(connection_error)?;

        Ok(entry)
    }

    async fn find_all_audit_entries_by_note(&self, note_id: i64) -> Result<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, PostgresAuditEntry>(
            r"
            SELECT *
            FROM audit_log
            WHERE note_id = $1
            ORDER BY changed_at ASC, id ASC
            ",
        )
        .bind(note_id)
        .fetch_all(&self.connection_pool)
        .await
        .map(AuditEntry::from_postgres_audit_entry_multiple)
        .map_err(connection_error)?;

        Ok(entries)
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
