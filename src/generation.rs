//! Coloring-page generation on top of an image service.
//!
//! `ImageService` is the seam to the hosted model; `generate_coloring_page`
//! adds the fixed line-art style and turns service failures into
//! [`AppError::Generation`].
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ServiceError};

pub const PROMPT_SUFFIX: &str = "coloring book page for a child, thick black outlines, no color, no shading, white background, simple, clean lines, cute cartoon style.";
pub const OUTPUT_MIME_TYPE: &str = "image/png";
pub const ASPECT_RATIO: &str = "1:1";

/// One encoded image as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Base64 image payload.
    pub data: String,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        GeneratedImage { data: data.into(), mime_type: mime_type.into() }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(base64::engine::general_purpose::STANDARD.encode(bytes), mime_type)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())
    }
}

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Request images for an already-styled prompt. An empty vector is a valid
    /// service answer; callers decide whether that is an error.
    async fn generate_images(&self, prompt: &str) -> Result<Vec<GeneratedImage>, ServiceError>;
}

pub fn styled_prompt(prompt: &str) -> String {
    format!("{}, {}", prompt, PROMPT_SUFFIX)
}

/// Generate a single coloring page for `prompt`.
///
/// Exactly one outbound call is made; there is no retry. The underlying cause
/// of a failure is logged here and kept inside the returned error.
pub async fn generate_coloring_page<S>(service: &S, prompt: &str) -> AppResult<GeneratedImage>
where
    S: ImageService + ?Sized,
{
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("Prompt must not be empty.".to_string()));
    }
    let full_prompt = styled_prompt(prompt);
    tracing::debug!(prompt = %full_prompt, "requesting coloring page");

    let result = service
        .generate_images(&full_prompt)
        .await
        .and_then(|images| images.into_iter().next().ok_or(ServiceError::Empty));

    result.map_err(|e| {
        tracing::error!("Error generating coloring page: {}", e);
        AppError::Generation(e)
    })
}


#[cfg(test)]
mod tests {
    use super::testing::FakeImageService;
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn appends_style_suffix() {
        let service = FakeImageService::default();
        let image = generate_coloring_page(&service, "a happy whale").await.unwrap();
        let sent = service.prompts();
        assert_eq!(sent, vec![format!("a happy whale, {}", PROMPT_SUFFIX)]);
        assert_eq!(image.decode_bytes().unwrap(), sent[0].as_bytes());
    }

    #[tokio::test]
    async fn empty_result_is_generation_error() {
        let mut service = FakeImageService::default();
        service.empty_on.insert("whale".into());
        let err = generate_coloring_page(&service, "a happy whale").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generation);
        assert!(matches!(err, AppError::Generation(ServiceError::Empty)));
        assert_eq!(err.user_message(), "Failed to generate coloring page.");
    }

    #[tokio::test]
    async fn service_failure_is_generation_error() {
        let mut service = FakeImageService::default();
        service.fail_on.insert("whale".into());
        let err = generate_coloring_page(&service, "a happy whale").await.unwrap_err();
        assert!(matches!(err, AppError::Generation(ServiceError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_service() {
        let service = FakeImageService::default();
        let err = generate_coloring_page(&service, "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.prompts().is_empty());
    }
}
