//! Gemini `:generateContent` client used for chat turns.
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatRole, ChatService, ChatTurn};
use crate::config::Config;
use crate::error::{AppResult, ServiceError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Agent => "model",
    }
}

fn build_request<'a>(
    system_instruction: &'a str,
    history: &'a [ChatTurn],
    message: &'a str,
) -> GenerateContentRequest<'a> {
    let mut contents: Vec<Content<'a>> = history
        .iter()
        .map(|turn| Content { role: Some(wire_role(turn.role)), parts: [Part { text: &turn.text }] })
        .collect();
    contents.push(Content { role: Some("user"), parts: [Part { text: message }] });
    GenerateContentRequest {
        system_instruction: Content { role: None, parts: [Part { text: system_instruction }] },
        contents,
    }
}

fn reply_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    let candidate = response.candidates.into_iter().next().ok_or(ServiceError::Empty)?;
    let content = candidate
        .content
        .ok_or_else(|| ServiceError::Malformed("candidate has no content".to_string()))?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        Err(ServiceError::Empty)
    } else {
        Ok(text)
    }
}

#[derive(Clone)]
pub struct GeminiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiChatClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        GeminiChatClient { client: Client::new(), base_url: base, model, api_key }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let key = config.require_api_key()?;
        Ok(Self::new(config.api_base.clone(), config.chat_model.clone(), key.to_string()))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request(&self, url: &str, body: &GenerateContentRequest<'_>) -> RequestBuilder {
        super::keyed_post(&self.client, url, &self.api_key).json(body)
    }
}

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn reply(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, ServiceError> {
        let url = self.endpoint();
        tracing::info!("Sending chat turn to Gemini at URL: {}", url);
        let body = build_request(system_instruction, history, message);
        let response = self.request(&url, &body).send().await?;
        let response = super::check_status(response).await?;
        let parsed: GenerateContentResponse = response.json().await?;
        reply_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_includes_history_and_instruction() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::agent("hello friend!")];
        let body = build_request("be nice", &history, "what is a cloud?");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "systemInstruction": {"parts": [{"text": "be nice"}]},
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello friend!"}]},
                    {"role": "user", "parts": [{"text": "what is a cloud?"}]}
                ]
            })
        );
    }

    #[test]
    fn api_key_is_sent_as_header() {
        let client = GeminiChatClient::new("https://example.test/v1beta".into(), "m".into(), "SECRET-KEY-123".into());
        let body = build_request("be nice", &[], "hi");
        let request = client.request(&client.endpoint(), &body).build().unwrap();
        assert_eq!(request.url().as_str(), "https://example.test/v1beta/models/m:generateContent");
        assert_eq!(request.headers()[crate::gemini::API_KEY_HEADER], "SECRET-KEY-123");
    }

    #[tokio::test]
    async fn failed_turn_does_not_expose_api_key() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let client = GeminiChatClient::new(format!("http://127.0.0.1:{}", port), "m".into(), "SECRET-KEY-123".into());
        let session = crate::chat::ChatSession::default();
        let err = crate::chat::send_message(&client, &session, "hello").await.unwrap_err();
        let logged = format!("{} {:?}", err, err);
        assert!(!logged.contains("SECRET-KEY-123"));
    }

    #[test]
    fn reply_joins_text_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Clouds are "}, {"text": "water!"}]}}]
        }))
        .unwrap();
        assert_eq!(reply_text(parsed).unwrap(), "Clouds are water!");
    }

    #[test]
    fn no_candidates_is_empty() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(reply_text(parsed), Err(ServiceError::Empty)));
    }
}
