//! Batch orchestration: one cover plus N pages, generated as a single unit.
use futures::future::try_join_all;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult, ServiceError};
use crate::generation::{generate_coloring_page, GeneratedImage, ImageService};
use crate::prompt::PromptConstructor;

pub const DEFAULT_PAGE_COUNT: usize = 5;
pub const MAX_PAGE_COUNT: usize = 20;

fn default_page_count() -> usize {
    DEFAULT_PAGE_COUNT
}

/// Deserialize a string with surrounding whitespace removed.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    #[serde(deserialize_with = "trimmed")]
    pub theme: String,
    #[serde(deserialize_with = "trimmed")]
    pub recipient_name: String,
    #[serde(default = "default_page_count")]
    pub page_count: usize,
}

impl BookRequest {
    pub fn new(theme: impl Into<String>, recipient_name: impl Into<String>) -> Self {
        BookRequest {
            theme: theme.into().trim().to_string(),
            recipient_name: recipient_name.into().trim().to_string(),
            page_count: DEFAULT_PAGE_COUNT,
        }
    }

    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.theme.trim().is_empty() || self.recipient_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in both the theme and the child's name.".to_string(),
            ));
        }
        if self.page_count == 0 || self.page_count > MAX_PAGE_COUNT {
            return Err(AppError::Validation(format!(
                "Page count must be between 1 and {}.",
                MAX_PAGE_COUNT
            )));
        }
        Ok(())
    }

    pub fn prompts(&self) -> PromptConstructor<'_> {
        PromptConstructor::new(self.theme.trim(), self.recipient_name.trim())
    }

    pub fn title(&self) -> String {
        self.prompts().title()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResult {
    pub cover: GeneratedImage,
    pub pages: Vec<GeneratedImage>,
}

/// Generate the cover and every page concurrently.
///
/// All requests are in flight at once and results keep prompt order. The
/// batch is all-or-nothing: the first failure is returned and the remaining
/// requests are dropped.
pub async fn generate_book<S>(service: &S, request: &BookRequest) -> AppResult<BookResult>
where
    S: ImageService + ?Sized,
{
    request.validate()?;
    let prompts = request.prompts().all_prompts(request.page_count);
    tracing::info!(
        theme = %request.theme,
        pages = request.page_count,
        "generating coloring book ({} requests)",
        prompts.len()
    );

    let mut images = try_join_all(prompts.iter().map(|p| generate_coloring_page(service, p))).await?;
    let pages = images.split_off(1);
    let cover = images
        .pop()
        .ok_or(AppError::Generation(ServiceError::Empty))?;

    debug_assert_eq!(pages.len(), request.page_count);
    tracing::info!(theme = %request.theme, "coloring book generated");
    Ok(BookResult { cover, pages })
}
