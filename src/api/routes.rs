//! Shared state and router wiring for the HTTP API.
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::book::MAX_PAGE_COUNT;
use crate::chat::{ChatService, SessionSlot};
use crate::document::RasterDecoder;
use crate::generation::ImageService;

/// Upper bound for one base64-encoded image posted back for PDF export.
pub const MAX_ENCODED_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Body limit for `/books/pdf`: a cover plus the largest book, with room for the JSON around it.
pub const PDF_BODY_LIMIT: usize = (MAX_PAGE_COUNT + 1) * MAX_ENCODED_IMAGE_BYTES + 64 * 1024;

pub struct AppState {
    pub image_service: Arc<dyn ImageService>,
    pub chat_service: Arc<dyn ChatService>,
    pub decoder: Arc<dyn RasterDecoder>,
    /// The server's chat session, created on the first chat request.
    pub session: SessionSlot,
}

impl AppState {
    pub fn new(
        image_service: Arc<dyn ImageService>,
        chat_service: Arc<dyn ChatService>,
        decoder: Arc<dyn RasterDecoder>,
    ) -> Self {
        AppState { image_service, chat_service, decoder, session: SessionSlot::new() }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/books", post(handlers::create_book))
        .route(
            "/books/pdf",
            post(handlers::download_pdf).layer(DefaultBodyLimit::max(PDF_BODY_LIMIT)),
        )
        .route("/chat", post(handlers::send_chat))
        .route("/chat/history", get(handlers::chat_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
