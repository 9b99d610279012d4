//! Write side of the catalog: book and chapter records, each tied to a file
//! already persisted by the upload store.

use crate::{
    errors::{ServiceError, ServiceResult},
    models::{book::NewBook, chapter::NewChapter},
    services::{
        database::Database,
        upload_service::{StoredFile, UploadStore},
    },
};
use tracing::debug;

pub const IMAGE_REQUIRED: &str = "Image file is required!";
pub const AUDIO_REQUIRED: &str = "Audio file is required!";

#[derive(Clone, Debug)]
pub struct IngestionService {
    db: Database,
    uploads: UploadStore,
}

impl IngestionService {
    pub fn new(db: Database, uploads: UploadStore) -> Self {
        Self { db, uploads }
    }

    /// Insert a book whose image link is the stored cover's filename.
    ///
    /// The cover is left on disk if the insert fails: another book may
    /// already reference a file with the same name.
    pub async fn upload_book(
        &self,
        book: NewBook,
        image: Option<StoredFile>,
    ) -> ServiceResult<i64> {
        let image = image.ok_or_else(|| ServiceError::validation(IMAGE_REQUIRED))?;

        let result = sqlx::query(
            "INSERT INTO book (name, author, subject, language, image_link)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.subject)
        .bind(&book.language)
        .bind(image.link())
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        debug!("recorded book {} with cover `{}`", id, image.original_name);
        Ok(id)
    }

    /// Insert a chapter pointing at the stored audio file.
    ///
    /// The audio file has a generated name used by this chapter alone, so it
    /// is removed again when the chapter cannot be recorded.
    pub async fn upload_chapter(
        &self,
        chapter: NewChapter,
        audio: Option<StoredFile>,
    ) -> ServiceResult<i64> {
        let audio = audio.ok_or_else(|| ServiceError::validation(AUDIO_REQUIRED))?;

        let result = self.insert_chapter(&chapter, &audio).await;
        if result.is_err() {
            self.uploads.discard(&audio).await;
        }
        result
    }

    async fn insert_chapter(
        &self,
        chapter: &NewChapter,
        audio: &StoredFile,
    ) -> ServiceResult<i64> {
        let book_id = parse_int(chapter.book_id.as_deref(), "Invalid book id.")?;
        let number = parse_int(chapter.chapter_number.as_deref(), "Invalid chapter number.")?;

        let result = sqlx::query(
            "INSERT INTO chapters (book_id, chapter_name, chapter_number, audio_link)
             VALUES (?, ?, ?, ?)",
        )
        .bind(book_id)
        .bind(chapter.chapter_name.as_deref().unwrap_or_default())
        .bind(number)
        .bind(audio.link())
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            "recorded chapter {} of book {} ({} bytes of audio)",
            id, book_id, audio.size_bytes
        );
        Ok(id)
    }
}

fn parse_int(value: Option<&str>, message: &str) -> ServiceResult<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| ServiceError::validation(message))
}
