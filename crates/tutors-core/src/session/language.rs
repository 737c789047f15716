//! Language codes and the fixed two-language pair of a conversation.

use crate::error::{Result, TutorsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized language code such as `es`, `en` or `pt-br`.
///
/// Codes are trimmed and lowercased on construction. Each `-` separated
/// segment must be 2 to 8 ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parses and normalizes a language code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` if the code is empty or malformed.
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let raw = code.as_ref();
        let normalized = raw.trim().to_ascii_lowercase();

        let well_formed = !normalized.is_empty()
            && normalized.split('-').all(|segment| {
                (2..=8).contains(&segment.len())
                    && segment.chars().all(|c| c.is_ascii_alphabetic())
            });

        if well_formed {
            Ok(Self(normalized))
        } else {
            Err(TutorsError::invalid_language(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary subtag, e.g. `pt` for `pt-br`.
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = TutorsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = TutorsError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Selects one of the two transcripts of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Primary,
    Secondary,
}

impl Side {
    /// The opposite transcript.
    pub fn other(self) -> Self {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }
}

/// The two distinct languages a conversation is held in.
///
/// Fixed for the lifetime of a conversation; changing either language
/// means starting a new conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    primary: LanguageCode,
    secondary: LanguageCode,
}

impl LanguagePair {
    /// Creates a pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` if both codes are the same.
    pub fn new(primary: LanguageCode, secondary: LanguageCode) -> Result<Self> {
        if primary == secondary {
            return Err(TutorsError::invalid_language(secondary.as_str()));
        }
        Ok(Self { primary, secondary })
    }

    /// Parses both codes and builds the pair.
    pub fn parse(primary: &str, secondary: &str) -> Result<Self> {
        Self::new(LanguageCode::new(primary)?, LanguageCode::new(secondary)?)
    }

    pub fn primary(&self) -> &LanguageCode {
        &self.primary
    }

    pub fn secondary(&self) -> &LanguageCode {
        &self.secondary
    }

    /// Returns the language of the given side.
    pub fn lang(&self, side: Side) -> &LanguageCode {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    /// Returns which side a language belongs to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` for a language outside the pair.
    pub fn side_of(&self, lang: &LanguageCode) -> Result<Side> {
        if *lang == self.primary {
            Ok(Side::Primary)
        } else if *lang == self.secondary {
            Ok(Side::Secondary)
        } else {
            Err(TutorsError::invalid_language(lang.as_str()))
        }
    }
}
