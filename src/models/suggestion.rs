//! Free-text user feedback.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `comments` table. `created_at` is assigned by storage (UTC).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Suggestion {
    pub id: i64,
    pub comment_text: String,
    pub created_at: NaiveDateTime,
}
