//! Client configuration.
//!
//! Read from `~/.config/tutors/config.toml`; every field is optional and
//! environment variables override the file.

use crate::error::{Result, TutorsError};
use crate::session::{ChatMode, LanguagePair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "TUTORS_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TUTORS_TIMEOUT_SECS";
pub const ENV_PRIMARY_LANG: &str = "TUTORS_PRIMARY_LANG";
pub const ENV_SECONDARY_LANG: &str = "TUTORS_SECONDARY_LANG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL of the tutor backend.
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Language the learner is studying.
    pub primary_lang: String,
    /// Language the learner already speaks.
    pub secondary_lang: String,
    pub mode: ChatMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            primary_lang: "es".to_string(),
            secondary_lang: "en".to_string(),
            mode: ChatMode::Chat,
        }
    }
}

impl ClientConfig {
    /// Loads the config file at the default location, then applies
    /// environment overrides. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads a config file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file exists but cannot be read, or
    /// `Serialization` if it is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "[Config] No config file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::debug!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                TutorsError::config(format!("{ENV_TIMEOUT_SECS} must be a number, got '{raw}'"))
            })?;
        }
        if let Some(lang) = lookup(ENV_PRIMARY_LANG) {
            self.primary_lang = lang;
        }
        if let Some(lang) = lookup(ENV_SECONDARY_LANG) {
            self.secondary_lang = lang;
        }
        Ok(())
    }

    /// Validates and returns the configured language pair.
    pub fn language_pair(&self) -> Result<LanguagePair> {
        LanguagePair::parse(&self.primary_lang, &self.secondary_lang)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Returns the config directory: ~/.config/tutors
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| TutorsError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("tutors"))
}

/// Returns the path to the configuration file: ~/.config/tutors/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
