//! Conversation mode.

use crate::error::TutorsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the assistant engages with the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Free conversation with gentle corrections.
    #[default]
    Chat,
    /// Questions about vocabulary and grammar. Uses its own short-lived transcript.
    Tutor,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Chat => "chat",
            ChatMode::Tutor => "tutor",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = TutorsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(ChatMode::Chat),
            "tutor" => Ok(ChatMode::Tutor),
            other => Err(TutorsError::config(format!("unknown mode '{other}'"))),
        }
    }
}
