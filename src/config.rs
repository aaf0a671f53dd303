//! Configuration for the vaani client
//!
//! Settings come from an optional TOML file under the platform config
//! directory, overridden by environment variables. API keys are wrapped in
//! [`SecretString`] so they never appear in debug output.

use std::path::PathBuf;

use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;

use crate::{Error, Result};

/// Stock user text substituted when a send carries only an image
/// ("what is in this picture?")
pub const DEFAULT_IMAGE_PROMPT: &str = "ఈ చిత్రంలో ఏముంది?";

/// Client configuration
#[derive(Debug)]
pub struct Config {
    /// Streaming chat gateway endpoint
    pub chat_url: String,

    /// Bearer key for the chat gateway
    pub chat_api_key: SecretString,

    /// Narration backend settings
    pub tts: TtsConfig,

    /// Narration language preferences
    pub language: LanguageConfig,

    /// User text substituted for image-only sends
    pub image_prompt: String,
}

/// Narration backend settings
#[derive(Debug)]
pub struct TtsConfig {
    /// API key for the speech endpoint; narration is muted when absent
    pub api_key: Option<SecretString>,

    /// Speech model identifier
    pub model: String,

    /// Named voice
    pub voice: String,
}

/// Narration language preferences
#[derive(Clone, Debug)]
pub struct LanguageConfig {
    /// Language code fragment to match voice tags against, e.g. `te`
    pub target: String,

    /// Lowercase language name matched against voice labels, e.g. `telugu`,
    /// for backends that omit language tags
    pub target_name: String,

    /// Full language tag used when no voice matches, e.g. `te-IN`
    pub target_code: String,

    /// Fallback language code fragment, e.g. `hi`
    pub fallback: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: "te".to_string(),
            target_name: "telugu".to_string(),
            target_code: "te-IN".to_string(),
            fallback: "hi".to_string(),
        }
    }
}

/// On-disk configuration file shape (all fields optional)
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    chat_url: Option<String>,
    chat_api_key: Option<String>,
    #[serde(default)]
    tts: TtsFile,
    #[serde(default)]
    language: LanguageFile,
    image_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TtsFile {
    api_key: Option<String>,
    model: Option<String>,
    voice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LanguageFile {
    target: Option<String>,
    target_name: Option<String>,
    target_code: Option<String>,
    fallback: Option<String>,
}

impl Config {
    /// Load configuration from the config file and environment
    ///
    /// Environment variables (`VAANI_CHAT_URL`, `VAANI_API_KEY`,
    /// `OPENAI_API_KEY`) override file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed, or if no
    /// chat endpoint / key is configured anywhere.
    pub fn load() -> Result<Self> {
        let file = Self::config_path()
            .filter(|path| path.exists())
            .map(|path| -> Result<ConfigFile> {
                let raw = std::fs::read_to_string(&path)?;
                Ok(toml::from_str(&raw)?)
            })
            .transpose()?
            .unwrap_or_default();

        let chat_url = std::env::var("VAANI_CHAT_URL")
            .ok()
            .or(file.chat_url)
            .ok_or_else(|| Error::Config("chat endpoint not configured".to_string()))?;

        let chat_api_key = std::env::var("VAANI_API_KEY")
            .ok()
            .or(file.chat_api_key)
            .map(SecretString::from)
            .ok_or_else(|| Error::Config("chat API key not configured".to_string()))?;

        let tts_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .or(file.tts.api_key)
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        let defaults = LanguageConfig::default();

        Ok(Self {
            chat_url,
            chat_api_key,
            tts: TtsConfig {
                api_key: tts_key,
                model: file.tts.model.unwrap_or_else(|| "tts-1".to_string()),
                voice: file.tts.voice.unwrap_or_else(|| "nova".to_string()),
            },
            language: LanguageConfig {
                target: file.language.target.unwrap_or(defaults.target),
                target_name: file.language.target_name.unwrap_or(defaults.target_name),
                target_code: file.language.target_code.unwrap_or(defaults.target_code),
                fallback: file.language.fallback.unwrap_or(defaults.fallback),
            },
            image_prompt: file
                .image_prompt
                .unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_string()),
        })
    }

    /// Location of the configuration file, if a home directory exists
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "vaani").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_parses_with_partial_sections() {
        let raw = r#"
            chat_url = "https://example.test/chat"

            [language]
            target = "te"
        "#;
        let file: ConfigFile = toml::from_str(raw).unwrap();
        assert_eq!(file.chat_url.as_deref(), Some("https://example.test/chat"));
        assert_eq!(file.language.target.as_deref(), Some("te"));
        assert!(file.tts.api_key.is_none());
    }

    #[test]
    fn empty_file_parses() {
        let file: ConfigFile = toml::from_str("").unwrap();
        assert!(file.chat_url.is_none());
    }
}
