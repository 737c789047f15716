//! Error types for the Tutors client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Tutors client.
///
/// Every variant except `InvalidLanguage` and `Internal` describes a
/// recoverable condition: callers convert it into a user-visible state and
/// keep the session alive.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorsError {
    /// A language code that is malformed or not part of the conversation's pair
    #[error("Invalid language: '{lang}'")]
    InvalidLanguage { lang: String },

    /// Translation response was not positionally aligned with the request
    #[error("Translation mismatch: expected {expected} strings, got {actual}")]
    TranslationMismatch { expected: usize, actual: usize },

    /// Transport-level failure talking to a backend service
    #[error("Network error ({service}): {message}")]
    Network {
        service: &'static str,
        message: String,
    },

    /// Backend answered with a non-success status
    #[error("HTTP {status} from {service}: {message}")]
    Http {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Another sync or turn is still in flight
    #[error("Busy: {0}")]
    Busy(String),

    /// The display transcript is missing turns the other transcript holds
    #[error("{lang} transcript is behind by {missing} message(s); switch languages again to catch up")]
    Unsynced { lang: String, missing: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TutorsError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidLanguage error
    pub fn invalid_language(lang: impl Into<String>) -> Self {
        Self::InvalidLanguage { lang: lang.into() }
    }

    /// Creates a TranslationMismatch error
    pub fn translation_mismatch(expected: usize, actual: usize) -> Self {
        Self::TranslationMismatch { expected, actual }
    }

    /// Creates a Network error for the named service
    pub fn network(service: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            service,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Busy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    /// Creates an Unsynced error
    pub fn unsynced(lang: impl Into<String>, missing: usize) -> Self {
        Self::Unsynced {
            lang: lang.into(),
            missing,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a TranslationMismatch error
    pub fn is_translation_mismatch(&self) -> bool {
        matches!(self, Self::TranslationMismatch { .. })
    }

    /// Check if this failure came from talking to a backend
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Http { .. })
    }

    /// Returns true when the session can continue after this error.
    ///
    /// `InvalidLanguage` and `Internal` are programmer errors.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidLanguage { .. } | Self::Internal(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TutorsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TutorsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TutorsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TutorsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Serialization {
                format: "JSON".to_string(),
                message: err.to_string(),
            };
        }
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::Network {
            service: "http",
            message,
        }
    }
}

/// A type alias for `Result<T, TutorsError>`.
pub type Result<T> = std::result::Result<T, TutorsError>;
