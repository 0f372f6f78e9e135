use crate::core::ChatError;
use crate::types::Provider;
use serde::Deserialize;
use std::fs;
use std::path::Path;

include!(concat!(env!("OUT_DIR"), "/config_embedded.rs"));

/// What to do when the byte stream ends without the completion sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamEndPolicy {
    /// Treat the server's close as the completion signal
    #[default]
    Complete,
    /// Surface an unterminated-stream error instead
    Error,
}

/// Per-provider defaults applied when a request does not spell them out.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub default_model: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Client-wide settings, loaded from `config.toml` when present.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub provider: Provider,
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    #[serde(default)]
    pub stream_end: StreamEndPolicy,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("Invalid default config")
    }
}

impl ClientConfig {
    /// Loads `config.toml` from the working directory, falling back to the
    /// compiled-in default when the file does not exist.
    pub fn load() -> Result<Self, ChatError> {
        let config_path = Path::new("config.toml");
        if config_path.exists() {
            Self::load_from(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ChatError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config file: {e}")))
    }

    pub fn update_provider(&mut self, new_provider: Provider) {
        self.provider = new_provider;
    }

    /// Default model for the active provider.
    pub fn default_model(&self) -> &str {
        match self.provider {
            Provider::OpenAI => &self.openai.default_model,
            Provider::Anthropic => &self.anthropic.default_model,
        }
    }

    pub const fn max_tokens(&self) -> Option<u32> {
        match self.provider {
            Provider::OpenAI => self.openai.max_tokens,
            Provider::Anthropic => self.anthropic.max_tokens,
        }
    }
}
