pub mod catalog_handlers;
pub mod health_handlers;
pub mod suggestion_handlers;
pub mod upload_handlers;
