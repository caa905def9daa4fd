//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::book::{generate_book, trimmed, BookRequest};
use crate::chat::{send_message, ChatTurn};
use crate::document::{assemble_pdf, document_file_name};
use crate::error::{AppError, ErrorKind};
use crate::generation::GeneratedImage;

/// Maps an [`AppError`] to a status code and a user-safe JSON body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Generation | ErrorKind::Chat => StatusCode::BAD_GATEWAY,
            ErrorKind::Assembly | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({"error": self.0.user_message(), "kind": kind.as_str()});
        (status, Json(body)).into_response()
    }
}

pub async fn root() -> &'static str {
    "Coloring Book API"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub title: String,
    pub file_name: String,
    pub cover: GeneratedImage,
    pub pages: Vec<GeneratedImage>,
}

pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = generate_book(state.image_service.as_ref(), &request).await?;
    let title = request.title();
    Ok(Json(BookResponse {
        file_name: document_file_name(&request.recipient_name, &title),
        title,
        cover: book.cover,
        pages: book.pages,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PdfRequest {
    #[serde(deserialize_with = "trimmed")]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    pub recipient_name: String,
    pub cover: GeneratedImage,
    pub pages: Vec<GeneratedImage>,
}

pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PdfRequest>,
) -> Result<Response, ApiError> {
    if request.title.trim().is_empty() || request.recipient_name.trim().is_empty() {
        return Err(AppError::Validation("A title and the child's name are required.".to_string()).into());
    }
    if request.pages.is_empty() {
        return Err(AppError::Validation("Generate the coloring pages first.".to_string()).into());
    }

    let bytes = assemble_pdf(
        state.decoder.as_ref(),
        &request.cover,
        &request.pages,
        &request.title,
        &request.recipient_name,
    )
    .await?;
    let file_name = document_file_name(&request.recipient_name, &request.title);
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', "'"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
}

pub async fn send_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session = state.session.get_or_create_session().await;
    let reply = send_message(state.chat_service.as_ref(), session, &request.message).await?;
    Ok(Json(ChatResponse { session_id: session.id(), reply }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Option<Uuid>,
    pub turns: Vec<ChatTurn>,
}

pub async fn chat_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    match state.session.get() {
        Some(session) => Json(HistoryResponse { session_id: Some(session.id()), turns: session.history().await }),
        None => Json(HistoryResponse { session_id: None, turns: Vec::new() }),
    }
}
