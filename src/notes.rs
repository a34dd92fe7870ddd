//! Notes
//!
//! The note record and the rules a title has to follow

use chrono::naive::NaiveDateTime;
use unicode_normalization::UnicodeNormalization;

/// Maximum number of characters in a title
pub const MAX_TITLE_LENGTH: usize = 255;

/// A single note
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Note {
    /// Note ID, assigned by the storage and never reused
    pub id: i64,

    /// Title, always valid according to [`parse_title`]
    pub title: String,

    /// Optional content, unbounded
    pub content: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last mutated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted?
    pub is_deleted: bool,
}

impl Note {
    /// Is the note still part of the active notes?
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Why a title is rejected
#[derive(Debug, PartialEq, Eq)]
pub enum TitleError {
    /// Nothing left after trimming
    Empty,

    /// More than [`MAX_TITLE_LENGTH`] characters
    TooLong(usize),
}

impl std::fmt::Display for TitleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Title can not be empty"),
            Self::TooLong(length) => write!(
                f,
                "Title can not be longer than {MAX_TITLE_LENGTH} characters, got {length}"
            ),
        }
    }
}

/// Unicode normalize (NFC) a piece of text
///
/// Titles, content and search queries all go through here, so an "ä" typed as "a" plus a
/// combining diaeresis matches a precomposed "ä"
pub fn normalize_text(text: &str) -> String {
    text.nfc().collect::<String>()
}

/// Parse and normalize a title
///
/// The title is trimmed and normalized with [`normalize_text`] before its characters are
/// counted, so a decomposed "ä" counts as one character
pub fn parse_title(title: &str) -> Result<String, TitleError> {
    let title = normalize_text(title.trim());

    let length = title.chars().count();

    if length == 0 {
        return Err(TitleError::Empty);
    }

    if length > MAX_TITLE_LENGTH {
        return Err(TitleError::TooLong(length));
    }

    Ok(title)
}
