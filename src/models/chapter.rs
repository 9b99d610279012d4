//! An audio segment belonging to a book.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `chapters` table.
///
/// `book_id` is not checked against `book`; orphan chapters are valid rows.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Chapter {
    pub id: i64,
    pub book_id: i64,
    pub chapter_name: String,
    pub chapter_number: i64,

    /// URL path of the audio file, e.g. `/audio/<generated name>`.
    pub audio_link: String,
}

/// Raw text fields of a chapter upload, as submitted.
#[derive(Debug, Clone, Default)]
pub struct NewChapter {
    pub chapter_name: Option<String>,
    pub chapter_number: Option<String>,
    pub book_id: Option<String>,
}
