//! Read-only catalog endpoints. Responses are JSON arrays/objects.

use crate::{
    errors::AppError,
    models::{
        book::{Book, FilterOptions},
        chapter::Chapter,
    },
    services::catalog_service::{BookFilter, CatalogService},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

const SERVER_ERROR: &str = "Server error";

/// `GET /api/books?language=&subject=&author=&search=`
pub async fn list_books(
    State(catalog): State<CatalogService>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = catalog
        .list_books(&filter)
        .await
        .map_err(|err| AppError::from_service(err, SERVER_ERROR))?;
    Ok(Json(books))
}

/// `GET /api/books/{id}/chapters`
pub async fn list_chapters(
    State(catalog): State<CatalogService>,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<Chapter>>, AppError> {
    let chapters = catalog
        .list_chapters(&book_id)
        .await
        .map_err(|err| AppError::from_service(err, SERVER_ERROR))?;
    Ok(Json(chapters))
}

/// `GET /api/filters`
pub async fn list_filters(
    State(catalog): State<CatalogService>,
) -> Result<Json<FilterOptions>, AppError> {
    let options = catalog
        .list_filter_options()
        .await
        .map_err(|err| AppError::from_service(err, SERVER_ERROR))?;
    Ok(Json(options))
}
