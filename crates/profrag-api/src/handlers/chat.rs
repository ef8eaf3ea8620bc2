//! Chat handler
//!
//! Streams a recommendation as raw UTF-8 text. Anything that fails before
//! the first fragment is reported with a JSON error and a proper status;
//! a failure after that cuts the body short.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use profrag_core::Message;
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// One turn of the conversation
#[derive(Debug, ToSchema)]
pub struct MessageSchema {
    /// Author of the turn
    #[schema(example = "user")]
    pub role: String,
    /// Text of the turn
    #[schema(example = "Who is the best professor for algorithms?")]
    pub content: String,
}

/// Stream a professor recommendation for the conversation's last message
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body(content = Vec<MessageSchema>, description = "Conversation, oldest turn first"),
    responses(
        (status = 200, description = "Answer streamed as plain text", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid conversation", body = crate::error::ApiError),
        (status = 502, description = "Embedding, retrieval or completion provider failed", body = crate::error::ApiError),
        (status = 500, description = "Internal error", body = crate::error::ApiError)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<Message>>, JsonRejection>,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    async move {
        let Json(messages) = payload.map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected chat body");
            AppError::BadRequest(rejection.body_text())
        })?;

        validate_conversation(&messages)?;
        tracing::info!(turns = messages.len(), "Chat request received");

        let stream = state.rag.answer_stream(&messages).await.map_err(|e| {
            tracing::error!(error = %e, "Chat request failed before streaming");
            AppError::from(e)
        })?;

        let mut response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(stream),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert("x-request-id", value);
        }

        Ok::<_, AppError>(response)
    }
    .instrument(span)
    .await
}

fn validate_conversation(messages: &[Message]) -> Result<(), AppError> {
    match messages.last() {
        None => Err(AppError::BadRequest(
            "conversation must not be empty".to_string(),
        )),
        Some(last) if last.content.trim().is_empty() => Err(AppError::BadRequest(
            "last message content cannot be empty".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
