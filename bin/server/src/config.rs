//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, with `__` separating sections
//! (e.g. `TELEGRAM__API_KEY`, `GEMINI__API_KEY`).

use serde::Deserialize;

/// Server configuration composed from per-collaborator sections.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Telegram Bot API configuration.
    pub telegram: TelegramConfig,

    /// Gemini model configuration.
    pub gemini: GeminiConfig,

    /// Market data source configuration.
    #[serde(default)]
    pub market: MarketConfig,
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub api_key: String,

    /// API base URL; overridable for tests.
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,
}

/// Gemini model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// Gemini API key.
    pub api_key: String,

    /// Model identifier.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL override, if any.
    pub base_url: Option<String>,
}

/// Market data source configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketConfig {
    /// API base URL override, if any.
    pub base_url: Option<String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_optional_fields() {
        assert_eq!(default_listen_addr(), "127.0.0.1:8080");
        assert_eq!(default_telegram_base_url(), "https://api.telegram.org");
        assert_eq!(default_gemini_model(), "gemini-2.0-flash");
        assert!(MarketConfig::default().base_url.is_none());
    }
}
