//! Friendly chatbot sessions.
//!
//! A [`ChatSession`] is an explicit object owned by whoever drives the
//! conversation. It carries the system instruction and the turns exchanged
//! so far; the [`ChatService`] is stateless and receives the full history on
//! every call. [`SessionSlot`] gives the lazily-created, create-once handle
//! used by the server and the CLI.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ServiceError};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a friendly and helpful chatbot for children. Keep your answers simple, fun, and encouraging.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        ChatTurn { role: ChatRole::User, text: text.into() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        ChatTurn { role: ChatRole::Agent, text: text.into() }
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Produce the agent's reply to `message`, given the earlier turns.
    async fn reply(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, ServiceError>;
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    system_instruction: String,
    history: Mutex<Vec<ChatTurn>>,
}

impl ChatSession {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        ChatSession {
            id: Uuid::new_v4(),
            system_instruction: system_instruction.into(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub async fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().await.clone()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        ChatSession::new(SYSTEM_INSTRUCTION)
    }
}

/// Send one user utterance on `session` and return the agent's reply.
///
/// Turns on one session are serialized. Both turns are appended only when
/// the service answers; a failed call leaves the history untouched.
pub async fn send_message<S>(service: &S, session: &ChatSession, text: &str) -> AppResult<String>
where
    S: ChatService + ?Sized,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Message must not be empty.".to_string()));
    }

    let mut history = session.history.lock().await;
    let reply = service
        .reply(&session.system_instruction, &history, text)
        .await
        .and_then(|r| if r.trim().is_empty() { Err(ServiceError::Empty) } else { Ok(r) })
        .map_err(|e| {
            tracing::error!(session = %session.id, "Error sending message to bot: {}", e);
            AppError::Chat(e)
        })?;

    history.push(ChatTurn::user(text));
    history.push(ChatTurn::agent(reply.clone()));
    tracing::debug!(session = %session.id, turns = history.len(), "chat turn completed");
    Ok(reply)
}

/// Create-once holder for a chat session.
///
/// Concurrent first callers wait on the same initialization, so only one
/// session is ever created per slot.
#[derive(Debug, Default)]
pub struct SessionSlot {
    cell: OnceCell<ChatSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create_session(&self) -> &ChatSession {
        self.cell
            .get_or_init(|| async {
                let session = ChatSession::default();
                tracing::info!(session = %session.id(), "created chat session");
                session
            })
            .await
    }

    pub fn get(&self) -> Option<&ChatSession> {
        self.cell.get()
    }
}
