//! Runtime configuration for the outbound integrations.
//!
//! Populated by the CLI from flags and environment variables. Absent or
//! empty settings are valid and simply disable the integration.

use std::time::Duration;

pub const DEFAULT_AUGMENT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_LLM_API_URL: &str = "https://api.x.ai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "grok-4-latest";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 500;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// External comparison-augmentation webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            timeout: DEFAULT_AUGMENT_TIMEOUT,
        }
    }
}

impl AugmentConfig {
    /// Webhook URL, treating a blank string as unset.
    pub fn endpoint(&self) -> Option<&str> {
        non_blank(self.webhook_url.as_deref())
    }
}

/// OpenAI-compatible chat-completions endpoint used for free-text analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_LLM_API_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            timeout: DEFAULT_LLM_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// API key, treating a blank string as unset.
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
