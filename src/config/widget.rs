use chrono::Duration;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api/chat";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are the friendly assistant on a personal portfolio site. Answer questions about the site owner's projects, skills and experience concisely. If you do not know something, say so and suggest using the contact section.";
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hi! I'm the assistant for this site. Ask me anything about the projects or experience you see here.";
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, I ran into a problem. Please try again later, or reach out through the contact section.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Widget config file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Widget config JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid widget config value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Settings object for the chat widget. Field names follow the camelCase
/// keys used by the site's front-end settings.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub api_url: String,
    /// Client-exposed key. When set, requests carry it as a bearer token.
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub welcome_message: String,
    pub fallback_message: String,
    /// Snapshot lifetime in milliseconds.
    pub cache_expiry: i64,
    pub max_messages: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on one round trip, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            cache_expiry: 24 * 60 * 60 * 1000,
            max_messages: 20,
            temperature: 0.7,
            max_tokens: 1000,
            request_timeout_secs: 60,
        }
    }
}

impl WidgetConfig {
    pub fn cache_expiry(&self) -> Duration {
        Duration::milliseconds(self.cache_expiry)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_url).map_err(|e| ConfigError::Invalid {
            field: "apiUrl",
            reason: e.to_string(),
        })?;
        if self.max_messages == 0 {
            return Err(ConfigError::Invalid {
                field: "maxMessages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cache_expiry <= 0 {
            return Err(ConfigError::Invalid {
                field: "cacheExpiry",
                reason: "must be a positive number of milliseconds".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "requestTimeoutSecs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

pub fn load_widget_config_from_str(json: &str) -> Result<WidgetConfig, ConfigError> {
    let config: WidgetConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_widget_config(path: impl AsRef<Path>) -> Result<WidgetConfig, ConfigError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let config = load_widget_config_from_str(&json)?;
    info!("Loaded widget config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = load_widget_config_from_str(
            r#"{"model":"Qwen/Qwen2.5-7B-Instruct","maxMessages":6,"cacheExpiry":3600000}"#
        ).unwrap();
        assert_eq!(config.model, "Qwen/Qwen2.5-7B-Instruct");
        assert_eq!(config.max_messages, 6);
        assert_eq!(config.cache_expiry(), Duration::hours(1));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.welcome_message, DEFAULT_WELCOME_MESSAGE);
    }

    #[test]
    fn rejects_zero_history_cap() {
        let err = load_widget_config_from_str(r#"{"maxMessages":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "maxMessages", .. }));
    }

    #[test]
    fn rejects_relative_api_url() {
        let err = load_widget_config_from_str(r#"{"apiUrl":"/api/chat"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "apiUrl", .. }));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.json");
        fs::write(&path, r#"{"welcomeMessage":"Hello there"}"#).unwrap();
        let config = load_widget_config(&path).unwrap();
        assert_eq!(config.welcome_message, "Hello there");
    }
}
