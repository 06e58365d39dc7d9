//! Configuration and settings management
//!
//! Loads settings from environment variables and defines bot constants.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,
    /// API key for the chat-completion service
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,
    /// Model used for every reply
    #[serde(default = "default_chat_model_id")]
    pub chat_model_id: String,

    /// Directory holding the counter file and the media attachments
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Counter file name, relative to `data_dir`
    #[serde(default = "default_counts_file")]
    pub counts_file: String,

    /// Lower bound of the reply delay, in seconds
    #[serde(default = "default_reply_delay_min_secs")]
    pub reply_delay_min_secs: u64,
    /// Upper bound of the reply delay, in seconds
    #[serde(default = "default_reply_delay_max_secs")]
    pub reply_delay_max_secs: u64,

    /// Override for the base persona prompt
    pub base_prompt: Option<String>,
    /// Override for the escalated persona prompt
    pub escalated_prompt: Option<String>,
    /// Override for the photo caption
    pub photo_caption: Option<String>,
    /// Override for the audio caption
    pub audio_caption: Option<String>,
}

fn default_openai_api_base() -> String {
    DEFAULT_OPENAI_API_BASE.to_string()
}

fn default_chat_model_id() -> String {
    DEFAULT_CHAT_MODEL_ID.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_counts_file() -> String {
    COUNTS_FILE.to_string()
}

const fn default_reply_delay_min_secs() -> u64 {
    REPLY_DELAY_MIN_SECS
}

const fn default_reply_delay_max_secs() -> u64 {
    REPLY_DELAY_MAX_SECS
}

/// Build the layered configuration source shared by all settings loaders.
///
/// # Errors
///
/// Returns a `ConfigError` if a configuration file is malformed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__CHAT_MODEL_ID=gpt-4o ./target/app`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain variables; UPPER_SNAKE_CASE maps to snake_case, empty means unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use persona_relay::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required secret is missing.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(build_config()?)
    }

    /// Deserialize and validate settings from an already built `Config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if deserialization or validation fails.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message("TELEGRAM_TOKEN is missing".into()));
        }
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::Message("OPENAI_API_KEY is missing".into()));
        }
        if self.reply_delay_min_secs > self.reply_delay_max_secs {
            return Err(ConfigError::Message(format!(
                "REPLY_DELAY_MIN_SECS ({}) exceeds REPLY_DELAY_MAX_SECS ({})",
                self.reply_delay_min_secs, self.reply_delay_max_secs
            )));
        }
        Ok(())
    }

    /// Full path of the counter file
    #[must_use]
    pub fn counts_path(&self) -> PathBuf {
        self.data_dir.join(&self.counts_file)
    }
}

// Persistence and media

/// Default counter file name
pub const COUNTS_FILE: &str = "tg_message_counts.json";
/// Basename of the photo sent on the photo trigger
pub const PHOTO_BASENAME: &str = "special_photo";
/// Basename of the audio file sent on the audio trigger
pub const AUDIO_BASENAME: &str = "vocal_audio";
/// Image extensions accepted by the media lookup
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
/// Audio extensions accepted by the media lookup
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav"];

// Conversation schedule

/// Count from which the escalated persona is used
pub const ESCALATION_THRESHOLD: u64 = 8;
/// Count on which the photo is sent
pub const PHOTO_TRIGGER_COUNT: u64 = 6;
/// Count on which the audio file is sent
pub const AUDIO_TRIGGER_COUNT: u64 = 7;
/// Default lower bound of the reply delay
pub const REPLY_DELAY_MIN_SECS: u64 = 30;
/// Default upper bound of the reply delay
pub const REPLY_DELAY_MAX_SECS: u64 = 180;

// Completion request

/// Default OpenAI API base URL
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Default chat model
pub const DEFAULT_CHAT_MODEL_ID: &str = "gpt-3.5-turbo";
/// Sampling temperature of every completion
pub const CHAT_TEMPERATURE: f32 = 0.7;
/// Output token limit of every completion
pub const CHAT_MAX_TOKENS: u32 = 256;

// Telegram

/// Longest text sent in one message, in bytes (Telegram caps at 4096 chars)
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder()
            .set_override("telegram_token", "dummy_token")?
            .set_override("openai_api_key", "sk-dummy")
    }

    #[test]
    fn test_defaults_applied() -> Result<(), Box<dyn std::error::Error>> {
        let settings = Settings::from_config(base_builder()?.build()?)?;

        assert_eq!(settings.chat_model_id, "gpt-3.5-turbo");
        assert_eq!(settings.openai_api_base, DEFAULT_OPENAI_API_BASE);
        assert_eq!(settings.reply_delay_min_secs, 30);
        assert_eq!(settings.reply_delay_max_secs, 180);
        assert_eq!(
            settings.counts_path(),
            PathBuf::from(".").join("tg_message_counts.json")
        );
        assert!(settings.base_prompt.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_secret_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = Config::builder()
            .set_override("telegram_token", "dummy_token")?
            .build()?;
        assert!(Settings::from_config(cfg).is_err());
        Ok(())
    }

    #[test]
    fn test_blank_secret_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = base_builder()?.set_override("openai_api_key", "  ")?.build()?;
        let err = Settings::from_config(cfg).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("OPENAI_API_KEY is missing"));
        Ok(())
    }

    #[test]
    fn test_inverted_delay_bounds_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = base_builder()?
            .set_override("reply_delay_min_secs", 10)?
            .set_override("reply_delay_max_secs", 5)?
            .build()?;
        assert!(Settings::from_config(cfg).is_err());
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), Box<dyn std::error::Error>> {
        let cfg = base_builder()?
            .set_override("chat_model_id", "gpt-4o-mini")?
            .set_override("data_dir", "/srv/bot")?
            .set_override("counts_file", "counts.json")?
            .build()?;
        let settings = Settings::from_config(cfg)?;
        assert_eq!(settings.chat_model_id, "gpt-4o-mini");
        assert_eq!(settings.counts_path(), PathBuf::from("/srv/bot/counts.json"));
        Ok(())
    }
}
