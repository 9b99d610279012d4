//! Shared router state. Handlers extract just the service they need through
//! `FromRef`.

use crate::services::{
    catalog_service::CatalogService, database::Database, feedback_service::FeedbackService,
    ingestion_service::IngestionService, upload_service::UploadStore,
};
use axum::extract::FromRef;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Database,
    pub uploads: UploadStore,
    pub catalog: CatalogService,
    pub ingestion: IngestionService,
    pub feedback: FeedbackService,
}

impl AppState {
    /// Wire every service around one connector and one upload store.
    pub fn new(db: Database, uploads: UploadStore) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            ingestion: IngestionService::new(db.clone(), uploads.clone()),
            feedback: FeedbackService::new(db.clone()),
            db,
            uploads,
        }
    }
}
