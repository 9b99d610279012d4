//! Route table of the catalog backend.
//!
//! ## Structure
//! - **Catalog**
//!   - `GET  /api/books` — list books (language, subject, author, search)
//!   - `GET  /api/books/{id}/chapters` — chapters of one book
//!   - `GET  /api/filters` — distinct authors, languages, subjects
//! - **Uploads** (multipart, body capped at the file limit plus form slack)
//!   - `POST /api/upload/book`
//!   - `POST /api/upload/chapter`
//! - **Suggestions**
//!   - `GET  /api/suggestions`, `POST /api/suggestions`
//! - **Static files**: anything else is looked up in the public, images and
//!   audio directories, in that order; audio is also mounted at `/audio`.

use crate::{
    handlers::{
        catalog_handlers::{list_books, list_chapters, list_filters},
        health_handlers::{healthz, readyz},
        suggestion_handlers::{list_suggestions, submit_suggestion},
        upload_handlers::{upload_book, upload_chapter},
    },
    services::upload_service::{MAX_UPLOAD_BYTES, UploadKind, UploadStore},
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Room for the text fields and multipart framing around the file.
const FORM_SLACK_BYTES: usize = 1024 * 1024;
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES as usize + FORM_SLACK_BYTES;

/// Build the router. The caller attaches [`AppState`] with `with_state`.
pub fn routes(public_dir: &Path, uploads: &UploadStore) -> Router<AppState> {
    let images_dir = uploads.dir(UploadKind::Image);
    let audio_dir = uploads.dir(UploadKind::Audio);
    let static_files = ServeDir::new(public_dir)
        .fallback(ServeDir::new(images_dir).fallback(ServeDir::new(audio_dir)));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/books", get(list_books))
        .route("/api/books/{id}/chapters", get(list_chapters))
        .route("/api/filters", get(list_filters))
        .route(
            "/api/upload/book",
            post(upload_book).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/upload/chapter",
            post(upload_chapter).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/suggestions",
            get(list_suggestions).post(submit_suggestion),
        )
        .nest_service("/audio", ServeDir::new(audio_dir))
        .fallback_service(static_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{catalog_service::tests::insert_book, database::Database};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "catalog-test-boundary";

    struct TestApp {
        tmp: TempDir,
        db: Database,
        router: Router,
    }

    async fn app() -> TestApp {
        let tmp = tempfile::tempdir().unwrap();
        let public = tmp.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("index.html"), "<h1>catalog</h1>").unwrap();

        let uploads = UploadStore::new(tmp.path().join("images"), tmp.path().join("audio"));
        uploads.ensure_dirs().await.unwrap();
        let db = Database::in_memory().await.unwrap();
        let router = routes(&public, &uploads).with_state(AppState::new(db.clone(), uploads));

        TestApp { tmp, db, router }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    async fn fetch(router: &Router, uri: &str) -> Response {
        send(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn books_are_filtered_by_language_and_search() {
        let t = app().await;
        insert_book(&t.db, "Fireheart", "Ann Vale", "Fantasy", "English").await;
        insert_book(&t.db, "Icebound", "Ann Vale", "Adventure", "English").await;
        insert_book(&t.db, "Firestorm", "Luc Morel", "Fantasy", "French").await;

        let response = fetch(&t.router, "/api/books?language=English&search=fire").await;
        assert_eq!(response.status(), StatusCode::OK);

        let books = json(response).await;
        let books = books.as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"], 1);
        assert_eq!(books[0]["name"], "Fireheart");
        assert_eq!(books[0]["image_link"], "fireheart.jpg");
    }

    #[tokio::test]
    async fn chapters_of_unknown_book_are_an_empty_array() {
        let t = app().await;
        let response = fetch(&t.router, "/api/books/404/chapters").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn filters_expose_distinct_values() {
        let t = app().await;
        insert_book(&t.db, "Fireheart", "Ann Vale", "Fantasy", "English").await;
        insert_book(&t.db, "Icebound", "Ann Vale", "Fantasy", "English").await;

        let body = json(fetch(&t.router, "/api/filters").await).await;
        assert_eq!(body["authors"], serde_json::json!(["Ann Vale"]));
        assert_eq!(body["languages"], serde_json::json!(["English"]));
        assert_eq!(body["subjects"], serde_json::json!(["Fantasy"]));
    }

    #[tokio::test]
    async fn book_upload_stores_cover_and_row() {
        let t = app().await;
        let request = multipart_request(
            "/api/upload/book",
            &[
                Part::Text("name", "Fireheart"),
                Part::Text("author", "Ann Vale"),
                Part::Text("subject", "Fantasy"),
                Part::Text("language", "English"),
                Part::File("image", "fireheart.png", b"png-bytes"),
            ],
        );

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "Book uploaded successfully!");

        let stored = t.tmp.path().join("images").join("fireheart.png");
        assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");

        let books = json(fetch(&t.router, "/api/books").await).await;
        assert_eq!(books[0]["image_link"], "fireheart.png");
        assert_eq!(books[0]["author"], "Ann Vale");

        let cover = fetch(&t.router, "/fireheart.png").await;
        assert_eq!(cover.status(), StatusCode::OK);
        assert_eq!(text(cover).await, "png-bytes");
    }

    #[tokio::test]
    async fn book_upload_without_image_is_rejected() {
        let t = app().await;
        let request =
            multipart_request("/api/upload/book", &[Part::Text("name", "Fireheart")]);

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Image file is required!");
        assert_eq!(
            json(fetch(&t.router, "/api/books").await).await,
            serde_json::json!([])
        );
    }

    #[tokio::test]
    async fn non_multipart_book_upload_reads_as_missing_image() {
        let t = app().await;
        let request = Request::post("/api/upload/book")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Fireheart"}"#))
            .unwrap();

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Image file is required!");
    }

    #[tokio::test]
    async fn chapter_upload_is_served_under_audio() {
        let t = app().await;
        let request = multipart_request(
            "/api/upload/chapter",
            &[
                Part::Text("chapter_name", "Prologue"),
                Part::Text("chapter_number", "1"),
                Part::Text("book_id", "7"),
                Part::File("audio", "prologue.mp3", b"mp3-bytes"),
            ],
        );

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "Chapter uploaded successfully!");

        let chapters = json(fetch(&t.router, "/api/books/7/chapters").await).await;
        let chapters = chapters.as_array().unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0]["chapter_name"], "Prologue");
        assert_eq!(chapters[0]["chapter_number"], 1);

        let link = chapters[0]["audio_link"].as_str().unwrap().to_string();
        assert!(link.starts_with("/audio/") && link.ends_with(".mp3"));
        assert_ne!(link, "/audio/prologue.mp3");

        let audio = fetch(&t.router, &link).await;
        assert_eq!(audio.status(), StatusCode::OK);
        assert_eq!(text(audio).await, "mp3-bytes");
    }

    #[tokio::test]
    async fn chapter_upload_without_audio_is_rejected() {
        let t = app().await;
        let request = multipart_request(
            "/api/upload/chapter",
            &[
                Part::Text("chapter_name", "Prologue"),
                Part::Text("chapter_number", "1"),
                Part::Text("book_id", "1"),
            ],
        );

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "Audio file is required!");
        assert_eq!(
            json(fetch(&t.router, "/api/books/1/chapters").await).await,
            serde_json::json!([])
        );
    }

    #[tokio::test]
    async fn suggestion_round_trip() {
        let t = app().await;
        let request = Request::post("/api/suggestions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"comment_text":"hello"}"#))
            .unwrap();

        let response = send(&t.router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "Suggestion submitted.");

        let listed = json(fetch(&t.router, "/api/suggestions").await).await;
        assert_eq!(listed[0]["comment_text"], "hello");
        assert!(listed[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn suggestion_accepts_url_encoded_forms() {
        let t = app().await;
        let request = Request::post("/api/suggestions")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("comment_text=more+sci-fi"))
            .unwrap();

        assert_eq!(send(&t.router, request).await.status(), StatusCode::OK);
        let listed = json(fetch(&t.router, "/api/suggestions").await).await;
        assert_eq!(listed[0]["comment_text"], "more sci-fi");
    }

    #[tokio::test]
    async fn empty_suggestion_is_rejected() {
        let t = app().await;
        for body in [r#"{"comment_text":""}"#, "{}"] {
            let request = Request::post("/api/suggestions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap();

            let response = send(&t.router, request).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(text(response).await, "Suggestion text is required.");
        }
    }

    #[tokio::test]
    async fn storage_failure_hides_engine_detail() {
        let t = app().await;
        sqlx::query("DROP TABLE book")
            .execute(t.db.pool())
            .await
            .unwrap();

        let response = fetch(&t.router, "/api/books").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "Server error");
    }

    #[tokio::test]
    async fn public_assets_are_served_from_root() {
        let t = app().await;
        let response = fetch(&t.router, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "<h1>catalog</h1>");

        assert_eq!(
            fetch(&t.router, "/missing.css").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn readiness_checks_database_and_directories() {
        let t = app().await;
        let response = fetch(&t.router, "/readyz").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["database"]["ok"], true);
        assert_eq!(body["checks"]["images"]["ok"], true);
        assert_eq!(body["checks"]["audio"]["ok"], true);
    }
}
