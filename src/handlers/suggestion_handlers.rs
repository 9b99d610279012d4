//! Suggestion box endpoints.

use crate::{
    errors::AppError,
    models::suggestion::Suggestion,
    services::feedback_service::FeedbackService,
};
use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::header,
};
use serde::Deserialize;

/// Body of `POST /api/suggestions`, accepted as JSON or as a URL-encoded
/// form. Any other content type reads as an empty body.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionBody {
    pub comment_text: Option<String>,
}

impl<S> FromRequest<S> for SuggestionBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<SuggestionBody>::from_request(req, state)
                .await
                .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;
            Ok(body)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<SuggestionBody>::from_request(req, state)
                .await
                .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;
            Ok(body)
        } else {
            Ok(Self::default())
        }
    }
}

/// `GET /api/suggestions` — newest first.
pub async fn list_suggestions(
    State(feedback): State<FeedbackService>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let suggestions = feedback
        .list_suggestions()
        .await
        .map_err(|err| AppError::from_service(err, "Error fetching suggestions."))?;
    Ok(Json(suggestions))
}

/// `POST /api/suggestions`
pub async fn submit_suggestion(
    State(feedback): State<FeedbackService>,
    body: SuggestionBody,
) -> Result<&'static str, AppError> {
    feedback
        .submit_suggestion(body.comment_text.as_deref())
        .await
        .map_err(|err| AppError::from_service(err, "Error submitting suggestion."))?;
    Ok("Suggestion submitted.")
}
