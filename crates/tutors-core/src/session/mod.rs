//! Conversation domain module.
//!
//! This module contains the language model, message types, the backend's
//! canonical transcript, and the dual-transcript store the client works on.
//!
//! # Module Structure
//!
//! - `language`: Language codes and pairs (`LanguageCode`, `LanguagePair`, `Side`)
//! - `message`: Conversation message types (`MessageRole`, `Message`)
//! - `mode`: Conversation mode (`ChatMode`)
//! - `model`: Backend transcript used for rehydration (`ConversationSnapshot`)
//! - `transcript`: The dual-transcript store (`DualTranscript`)
//!
//! # Usage
//!
//! ```ignore
//! use tutors_core::session::{DualTranscript, LanguagePair, Side};
//! use tutors_core::session::{Message, MessageRole, ChatMode};
//! ```

mod language;
mod message;
mod mode;
mod model;
mod transcript;

// Re-export public API
pub use language::{LanguageCode, LanguagePair, Side};
pub use message::{Message, MessageRole, timestamp};
pub use mode::ChatMode;
pub use model::{ConversationSnapshot, StoredMessage};
pub use transcript::{DualTranscript, Notice};
