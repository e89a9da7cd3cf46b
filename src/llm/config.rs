//! LLM configuration parsed from environment variables.
//!
//! - `LLM_PROVIDER`: `anthropic` (default) or `openai`
//! - `LLM_API_KEY_ENV`: required, names the variable that holds the key
//! - `LLM_MODEL`: a small, cheap model per provider when absent
//! - `LLM_OPENAI_BASE_URL`: any chat-completions compatible gateway
//! - `LLM_REQUEST_TIMEOUT_SECS` / `LLM_CONNECT_TIMEOUT_SECS`: 60 / 10

use std::time::Duration;

use super::types::LlmError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi { base_url: String },
}

impl LlmProvider {
    fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::OpenAi { .. } => "gpt-4o-mini",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl LlmConfig {
    /// # Errors
    ///
    /// Returns an error for an unknown provider or a missing key.
    pub fn from_env() -> Result<Self, LlmError> {
        let provider = match std::env::var("LLM_PROVIDER").as_deref().map(str::trim) {
            Err(_) | Ok("" | "anthropic") => LlmProvider::Anthropic,
            Ok("openai") => LlmProvider::OpenAi {
                base_url: std::env::var("LLM_OPENAI_BASE_URL")
                    .map_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string(), |url| url.trim_end_matches('/').to_string()),
            },
            Ok(other) => return Err(LlmError::Config(format!("unknown LLM_PROVIDER: {other}"))),
        };

        let api_key = read_key()?;
        let model = std::env::var("LLM_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());

        Ok(Self {
            provider,
            api_key,
            model,
            request_timeout: Duration::from_secs(crate::env_parse(
                "LLM_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(crate::env_parse(
                "LLM_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        })
    }

    /// HTTP client carrying the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn http_client(&self) -> Result<reqwest::Client, LlmError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| LlmError::ClientBuild(e.to_string()))
    }
}

/// Resolve the key through the variable `LLM_API_KEY_ENV` names.
fn read_key() -> Result<String, LlmError> {
    let var = std::env::var("LLM_API_KEY_ENV").map_err(|_| LlmError::MissingApiKey { var: "LLM_API_KEY_ENV".into() })?;
    std::env::var(&var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(LlmError::MissingApiKey { var })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
