//! Conversation message types.
//!
//! A `Message` is one turn half in one language. It is immutable once
//! created: translated counterparts are new messages that copy the role and
//! timestamp of their original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the learner.
    User,
    /// Message from the tutor.
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in one transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: MessageRole,
    text: String,
    #[serde(with = "timestamp")]
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }

    /// Creates a user message stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text, Utc::now())
    }

    /// Creates an assistant message stamped now.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text, Utc::now())
    }

    /// Builds the counterpart of this message in another language.
    pub fn translated(&self, text: impl Into<String>) -> Self {
        Self::new(self.role, text, self.timestamp)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Timestamp (de)serialization.
///
/// Serializes as RFC 3339. Accepts RFC 3339 as well as the naive ISO 8601
/// form the backend stores (`2024-05-01T10:00:00.123456`), read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_translated_keeps_role_and_timestamp() {
        let original = Message::user("Hola");
        let translated = original.translated("Hello");

        assert_eq!(translated.role(), MessageRole::User);
        assert_eq!(translated.timestamp(), original.timestamp());
        assert_eq!(translated.text(), "Hello");
        assert_eq!(original.text(), "Hola");
    }

    #[test]
    fn test_timestamp_accepts_naive_backend_format() {
        let parsed = timestamp::parse("2024-05-01T10:00:00.123456").unwrap();
        assert_eq!(parsed.timestamp(), Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap().timestamp());

        let rfc = timestamp::parse("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());

        assert!(timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
