use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{fmt, io};
use thiserror::Error;

/// Failures raised by the catalog, ingestion, feedback and upload services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("file exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: u64 },
    #[error("malformed upload: {0}")]
    Upload(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Map a service failure onto a response.
    ///
    /// Caller-facing failures keep their message. Storage and I/O failures are
    /// logged here and replaced by `generic`, so engine detail never leaves the
    /// process.
    pub fn from_service(err: ServiceError, generic: &str) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::bad_request(msg),
            ServiceError::Upload(detail) => {
                tracing::warn!("rejected upload: {}", detail);
                Self::bad_request("Malformed upload.")
            }
            err @ ServiceError::PayloadTooLarge { .. } => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
            }
            ServiceError::Storage(err) => {
                tracing::error!("storage error: {}", err);
                Self::internal(generic)
            }
            ServiceError::Io(err) => {
                tracing::error!("file system error: {}", err);
                Self::internal(generic)
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
