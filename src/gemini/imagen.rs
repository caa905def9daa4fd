//! Imagen `:predict` client.
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppResult, ServiceError};
use crate::generation::{GeneratedImage, ImageService, ASPECT_RATIO, OUTPUT_MIME_TYPE};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [PredictInstance<'a>; 1],
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_options: OutputOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ImagenClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ImagenClient { client: Client::new(), base_url: base, model, api_key }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let key = config.require_api_key()?;
        Ok(Self::new(config.api_base.clone(), config.image_model.clone(), key.to_string()))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.model)
    }

    fn request(&self, url: &str, body: &PredictRequest<'_>) -> RequestBuilder {
        super::keyed_post(&self.client, url, &self.api_key).json(body)
    }

    /// Request exactly one square PNG for `prompt`.
    pub async fn predict(&self, prompt: &str) -> Result<Vec<GeneratedImage>, ServiceError> {
        let url = self.endpoint();
        tracing::info!("Sending prompt to Imagen at URL: {}", url);
        let body = PredictRequest {
            instances: [PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: ASPECT_RATIO,
                output_options: OutputOptions { mime_type: OUTPUT_MIME_TYPE },
            },
        };

        let response = self.request(&url, &body).send().await?;
        let response = super::check_status(response).await?;
        let parsed: PredictResponse = response.json().await?;
        let images = images_from_predictions(parsed);
        tracing::info!("Imagen returned {} image(s)", images.len());
        Ok(images)
    }
}

fn images_from_predictions(response: PredictResponse) -> Vec<GeneratedImage> {
    response
        .predictions
        .into_iter()
        .filter_map(|p| {
            let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
            let mime = p.mime_type.unwrap_or_else(|| OUTPUT_MIME_TYPE.to_string());
            Some(GeneratedImage::new(data, mime))
        })
        .collect()
}

#[async_trait]
impl ImageService for ImagenClient {
    async fn generate_images(&self, prompt: &str) -> Result<Vec<GeneratedImage>, ServiceError> {
        self.predict(prompt).await
    }
}
