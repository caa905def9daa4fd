//! Coloring Book API library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the server binary.
//! - `gemini`: Thin clients for the Imagen and Gemini REST endpoints.
//! - `generation`: The `ImageService` seam and single coloring-page generation.
//! - `prompt`: Cover and page prompt templating.
//! - `book`: All-or-nothing batch generation of a whole book.
//! - `document`: Layout and PDF assembly.
//! - `chat`: Chat sessions for the friendly chatbot.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error types and alias.
//!
//! Re-exports are provided for common types: `Config`, `ImagenClient`,
//! `GeminiChatClient`, `BookRequest` and `ChatSession`.
pub mod api;
pub mod book;
pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod prompt;

pub use book::{generate_book, BookRequest, BookResult};
pub use chat::{send_message, ChatSession, SessionSlot};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use gemini::{GeminiChatClient, ImagenClient};
pub use generation::{generate_coloring_page, GeneratedImage};
