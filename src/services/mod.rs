//! Service layer. Each service is constructed once at startup around the
//! shared [`database::Database`] and cloned into request handlers.

pub mod catalog_service;
pub mod database;
pub mod feedback_service;
pub mod ingestion_service;
pub mod upload_service;
