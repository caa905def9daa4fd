//! Error types shared by the library, the HTTP API and the CLI.
//!
//! Failures keep their kind and cause internally. The short user-safe text is
//! only produced at the surface through [`AppError::user_message`].
use thiserror::Error;

/// Failure talking to a hosted Gemini/Imagen endpoint.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed service response: {0}")]
    Malformed(String),
    #[error("service returned no content")]
    Empty,
}

/// Failure while decoding images or writing the PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("page {0} does not exist")]
    NoPage(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Generation,
    Chat,
    Assembly,
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Generation => "generation",
            ErrorKind::Chat => "chat",
            ErrorKind::Assembly => "assembly",
            ErrorKind::Config => "config",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("image generation failed: {0}")]
    Generation(#[source] ServiceError),
    #[error("chat request failed: {0}")]
    Chat(#[source] ServiceError),
    #[error("document assembly failed: {0}")]
    Assembly(#[from] RenderError),
    #[error("configuration error: {0}")]
    Config(String),
}

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate coloring page.";
pub const CHAT_FAILED_MESSAGE: &str =
    "I'm having a little trouble thinking right now. Please try again in a moment!";
pub const ASSEMBLY_FAILED_MESSAGE: &str = "Failed to build the coloring book PDF.";

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Generation(_) => ErrorKind::Generation,
            AppError::Chat(_) => ErrorKind::Chat,
            AppError::Assembly(_) => ErrorKind::Assembly,
            AppError::Config(_) => ErrorKind::Config,
        }
    }

    /// Text that is safe to show next to the control that triggered the failure.
    ///
    /// Validation messages are written for the user already; every other kind
    /// collapses to a fixed sentence so upstream details never leak.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Generation(_) => GENERATION_FAILED_MESSAGE.to_string(),
            AppError::Chat(_) => CHAT_FAILED_MESSAGE.to_string(),
            AppError::Assembly(_) => ASSEMBLY_FAILED_MESSAGE.to_string(),
            AppError::Config(msg) => msg.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_service_cause() {
        let err = AppError::Generation(ServiceError::Status {
            status: 429,
            body: "quota exceeded for project 1234".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Generation);
        assert_eq!(err.user_message(), GENERATION_FAILED_MESSAGE);
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn chat_errors_use_friendly_message() {
        let err = AppError::Chat(ServiceError::Empty);
        assert_eq!(err.kind().as_str(), "chat");
        assert_eq!(err.user_message(), CHAT_FAILED_MESSAGE);
    }

    #[test]
    fn validation_message_is_passed_through() {
        let err = AppError::Validation("Please fill in both the theme and the child's name.".into());
        assert_eq!(err.user_message(), "Please fill in both the theme and the child's name.");
    }
}
