//! Backend service contracts.
//!
//! Defines the request/response shapes of the tutor backend and the traits
//! the application layer calls them through. Implementations live in
//! `tutors-interaction`; tests provide in-memory mocks.

use crate::error::Result;
use crate::session::{ChatMode, ConversationSnapshot, LanguageCode, Message, MessageRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of the chat context sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub text: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            text: message.text().to_string(),
        }
    }
}

/// Request body of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(
        rename = "conversationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conversation_id: Option<String>,
    pub messages: Vec<ChatTurn>,
    pub language: LanguageCode,
    pub mode: ChatMode,
}

/// Response body of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub assistant_text: String,
}

/// Request body of the translation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: Vec<String>,
    pub source_lang: LanguageCode,
    pub target_lang: LanguageCode,
}

/// Response body of the translation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: Vec<String>,
}

/// Sends one chat exchange to the tutor.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Posts the conversation context and returns the assistant reply.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-success status is returned as a
    /// recoverable `Network`/`Http` error.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Batched translation service.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translates all texts in one call.
    ///
    /// Returns the translated strings exactly as the service sent them. The
    /// caller checks positional alignment with the request.
    async fn translate(&self, request: &TranslationRequest) -> Result<Vec<String>>;
}

/// Read access to the backend's conversation storage.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    /// Fetches the canonical transcript of a conversation.
    ///
    /// # Returns
    ///
    /// - `Ok(snapshot)`: Conversation found
    /// - `Err(NotFound)`: No conversation with that id
    /// - `Err(_)`: Transport or decoding failure
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationSnapshot>;
}

/// Backend liveness check.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health(&self) -> Result<bool>;
}
