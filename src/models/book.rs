//! A catalog entry for an audiobook title.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `book` table.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Book {
    /// Storage-generated identifier.
    pub id: i64,

    pub name: String,
    pub author: String,
    pub subject: String,
    pub language: String,

    /// Filename of the cover image, served from the web root.
    pub image_link: String,
}

/// Text fields of a book upload. Missing fields are stored as empty strings.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub subject: String,
    pub language: String,
}

/// Distinct values currently present in the `book` table.
#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub authors: Vec<String>,
    pub languages: Vec<String>,
    pub subjects: Vec<String>,
}
