//! Thin HTTP clients for the hosted Google generative endpoints.
//!
//! - `imagen`: `models/{model}:predict` for image generation.
//! - `chat`: `models/{model}:generateContent` for multi-turn chat.
pub mod chat;
pub mod imagen;

pub use chat::GeminiChatClient;
pub use imagen::ImagenClient;

use reqwest::{Client, RequestBuilder};

use crate::error::ServiceError;

/// Header carrying the API key. The key never goes into the URL, which
/// reqwest includes in its error text.
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

pub(crate) fn keyed_post(client: &Client, url: &str, api_key: &str) -> RequestBuilder {
    client.post(url).header(API_KEY_HEADER, api_key)
}

/// Turn a non-success response into `ServiceError::Status`, keeping the body for logs.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    tracing::error!("Request failed. Status: {}, Body: {}", status, body);
    Err(ServiceError::Status { status: status.as_u16(), body })
}
