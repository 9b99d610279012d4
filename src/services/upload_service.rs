//! Upload handler: persists multipart file fields beneath a directory chosen by
//! upload type.
//!
//! Bytes are streamed into a hidden temporary file next to their destination
//! and renamed into place only once the whole field has been read within the
//! size cap, so a rejected upload never leaves a partial file behind.
//!
//! Naming differs by type. Cover images keep the uploader's filename, so two
//! uploads with the same name share one file on disk. Chapter audio gets a
//! generated name and cannot collide.

use crate::errors::{ServiceError, ServiceResult};
use axum::{
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt},
};
use tokio_util::io::StreamReader;
use tracing::debug;
use uuid::Uuid;

/// Largest accepted file, in bytes (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const MAX_EXTENSION_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Audio,
}

impl UploadKind {
    /// Name of the multipart field carrying the file.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Audio => "audio",
        }
    }
}

/// Choose the on-disk name for an uploaded file.
///
/// Images keep the final path component of `original`; audio files are named
/// after `id`, keeping a short alphanumeric extension when there is one.
pub fn stored_name(kind: UploadKind, original: &str, id: Uuid) -> ServiceResult<String> {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();

    match kind {
        UploadKind::Image => {
            if base.is_empty()
                || base == "."
                || base == ".."
                || base.chars().any(|c| c.is_control())
            {
                return Err(ServiceError::validation("Invalid file name."));
            }
            Ok(base.to_string())
        }
        UploadKind::Audio => {
            let ext = Path::new(base)
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| {
                    !e.is_empty()
                        && e.len() <= MAX_EXTENSION_LEN
                        && e.chars().all(|c| c.is_ascii_alphanumeric())
                });
            Ok(match ext {
                Some(ext) => format!("{}.{}", id.simple(), ext.to_ascii_lowercase()),
                None => id.simple().to_string(),
            })
        }
    }
}

/// Public link recorded in the database for a stored file.
pub fn link_for(kind: UploadKind, stored_name: &str) -> String {
    match kind {
        UploadKind::Image => stored_name.to_string(),
        UploadKind::Audio => format!("/audio/{}", stored_name),
    }
}

/// A file that has been fully written to its final location.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub kind: UploadKind,
    pub original_name: String,
    pub stored_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl StoredFile {
    pub fn link(&self) -> String {
        link_for(self.kind, &self.stored_name)
    }
}

/// Text fields plus the (optional) file of one multipart submission.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<StoredFile>,
}

impl UploadForm {
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// Marks an error raised by the incoming body rather than by the disk.
#[derive(Debug, Error)]
#[error("{0}")]
struct BodyStreamError(String);

#[derive(Clone, Debug)]
pub struct UploadStore {
    images_dir: PathBuf,
    audio_dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(images_dir: impl Into<PathBuf>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            audio_dir: audio_dir.into(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Override the per-file size cap.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn dir(&self, kind: UploadKind) -> &Path {
        match kind {
            UploadKind::Image => &self.images_dir,
            UploadKind::Audio => &self.audio_dir,
        }
    }

    /// Create both upload directories if they are missing.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.images_dir).await?;
        fs::create_dir_all(&self.audio_dir).await
    }

    /// Stream one file to disk under the name chosen by [`stored_name`].
    pub async fn persist<S, E>(
        &self,
        kind: UploadKind,
        original_name: &str,
        stream: S,
    ) -> ServiceResult<StoredFile>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        let name = stored_name(kind, original_name, Uuid::new_v4())?;
        let dir = self.dir(kind);
        fs::create_dir_all(dir).await?;

        let file_path = dir.join(&name);
        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let body = Box::pin(stream.map_err(|err| {
            io::Error::new(ErrorKind::Other, BodyStreamError(err.to_string()))
        }));
        let mut reader = StreamReader::new(body).take(self.max_bytes + 1);

        let size_bytes = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) if n > self.max_bytes => {
                drop(file);
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ServiceError::PayloadTooLarge {
                    limit: self.max_bytes,
                });
            }
            Ok(n) => n,
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(&tmp_path).await;
                return Err(classify_copy_error(err));
            }
        };

        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ServiceError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ServiceError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ServiceError::Io(err));
            }
        }

        debug!("stored {} bytes at {}", size_bytes, file_path.display());

        Ok(StoredFile {
            kind,
            original_name: original_name.to_string(),
            stored_name: name,
            path: file_path,
            size_bytes,
        })
    }

    /// Best-effort removal of a stored file.
    pub async fn discard(&self, file: &StoredFile) {
        match fs::remove_file(&file.path).await {
            Ok(_) => debug!("removed orphaned upload {}", file.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!("failed to remove {}: {}", file.path.display(), err)
            }
        }
    }

    /// Read a whole multipart submission.
    ///
    /// The file field named after `kind` is persisted; text fields are
    /// collected. A file input submitted without a filename counts as no
    /// file. File fields under other names are skipped.
    pub async fn read_form(
        &self,
        multipart: &mut Multipart,
        kind: UploadKind,
    ) -> ServiceResult<UploadForm> {
        let mut form = UploadForm::default();
        match self.read_fields(multipart, kind, &mut form).await {
            Ok(()) => Ok(form),
            Err(err) => {
                if let Some(file) = form.file.as_ref().filter(|f| f.kind == UploadKind::Audio) {
                    self.discard(file).await;
                }
                Err(err)
            }
        }
    }

    async fn read_fields(
        &self,
        multipart: &mut Multipart,
        kind: UploadKind,
        form: &mut UploadForm,
    ) -> ServiceResult<()> {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) if name == kind.field_name() && form.file.is_none() => {
                    if file_name.is_empty() {
                        continue;
                    }
                    form.file = Some(self.persist(kind, &file_name, field).await?);
                }
                Some(_) => debug!("skipping unexpected file field `{}`", name),
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(())
    }
}

fn classify_copy_error(err: io::Error) -> ServiceError {
    let from_body = err
        .get_ref()
        .is_some_and(|inner| inner.downcast_ref::<BodyStreamError>().is_some());
    if from_body {
        ServiceError::Upload(err.to_string())
    } else {
        ServiceError::Io(err)
    }
}

fn multipart_error(err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge {
            limit: MAX_UPLOAD_BYTES,
        }
    } else {
        ServiceError::Upload(err.body_text())
    }
}
