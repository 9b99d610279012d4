//! Multipart ingestion endpoints.
//!
//! A request that is not `multipart/form-data` at all is treated as a form
//! without a file, so it fails the same way a form missing its file does.

use crate::{
    errors::AppError,
    models::{book::NewBook, chapter::NewChapter},
    services::{
        ingestion_service::IngestionService,
        upload_service::{UploadForm, UploadKind, UploadStore},
    },
};
use axum::extract::{Multipart, State, multipart::MultipartRejection};

async fn read_form(
    uploads: &UploadStore,
    multipart: Result<Multipart, MultipartRejection>,
    kind: UploadKind,
    generic: &str,
) -> Result<UploadForm, AppError> {
    match multipart {
        Ok(mut multipart) => uploads
            .read_form(&mut multipart, kind)
            .await
            .map_err(|err| AppError::from_service(err, generic)),
        Err(rejection) => {
            tracing::debug!("not a multipart request: {}", rejection);
            Ok(UploadForm::default())
        }
    }
}

/// `POST /api/upload/book` — fields `name`, `author`, `subject`, `language`
/// and the `image` file.
pub async fn upload_book(
    State(uploads): State<UploadStore>,
    State(ingestion): State<IngestionService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    const GENERIC: &str = "Error uploading book!";

    let mut form = read_form(&uploads, multipart, UploadKind::Image, GENERIC).await?;
    let book = NewBook {
        name: form.take("name").unwrap_or_default(),
        author: form.take("author").unwrap_or_default(),
        subject: form.take("subject").unwrap_or_default(),
        language: form.take("language").unwrap_or_default(),
    };

    ingestion
        .upload_book(book, form.file)
        .await
        .map_err(|err| AppError::from_service(err, GENERIC))?;

    Ok("Book uploaded successfully!")
}

/// `POST /api/upload/chapter` — fields `chapter_name`, `chapter_number`,
/// `book_id` and the `audio` file.
pub async fn upload_chapter(
    State(uploads): State<UploadStore>,
    State(ingestion): State<IngestionService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, AppError> {
    const GENERIC: &str = "Error uploading chapter!";

    let mut form = read_form(&uploads, multipart, UploadKind::Audio, GENERIC).await?;
    let chapter = NewChapter {
        chapter_name: form.take("chapter_name"),
        chapter_number: form.take("chapter_number"),
        book_id: form.take("book_id"),
    };

    ingestion
        .upload_chapter(chapter, form.file)
        .await
        .map_err(|err| AppError::from_service(err, GENERIC))?;

    Ok("Chapter uploaded successfully!")
}
