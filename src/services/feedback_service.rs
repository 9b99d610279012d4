//! Free-text suggestions left by listeners.

use crate::{
    errors::{ServiceError, ServiceResult},
    models::suggestion::Suggestion,
    services::database::Database,
};

pub const TEXT_REQUIRED: &str = "Suggestion text is required.";

#[derive(Clone, Debug)]
pub struct FeedbackService {
    db: Database,
}

impl FeedbackService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All suggestions, newest first. Rows created within the same clock tick
    /// keep insertion order (latest first).
    pub async fn list_suggestions(&self) -> ServiceResult<Vec<Suggestion>> {
        let suggestions = sqlx::query_as::<_, Suggestion>(
            "SELECT id, comment_text, created_at FROM comments
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(suggestions)
    }

    pub async fn submit_suggestion(&self, text: Option<&str>) -> ServiceResult<i64> {
        let text = text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::validation(TEXT_REQUIRED))?;

        let result = sqlx::query("INSERT INTO comments (comment_text) VALUES (?)")
            .bind(text)
            .execute(self.db.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }
}
