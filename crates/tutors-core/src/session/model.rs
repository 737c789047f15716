//! Canonical conversation transcript as stored by the backend.
//!
//! Used only to rehydrate a `DualTranscript` when an existing conversation
//! is opened.

use super::language::LanguageCode;
use super::message::{MessageRole, timestamp};
use super::mode::ChatMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted message, tagged with the language it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub text: String,
    #[serde(alias = "lang")]
    pub language: LanguageCode,
    #[serde(alias = "created_at", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// The full transcript of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(alias = "id")]
    pub conversation_id: String,
    pub primary_lang: LanguageCode,
    pub secondary_lang: LanguageCode,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}
