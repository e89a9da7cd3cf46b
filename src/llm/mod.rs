//! LLM — hosted-model client for the sanitization step.
//!
//! DESIGN
//! ======
//! Configured from environment variables. `LlmClient` owns one HTTP client
//! and hands each prompt to the configured provider module, which builds
//! its wire body and decodes the reply down to text. Callers hold an
//! `Arc<dyn LlmChat>` so tests can substitute a mock.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod types;

use serde::Serialize;

use config::{LlmConfig, LlmProvider};
pub use types::LlmChat;
use types::{LlmError, Prompt};

// =============================================================================
// CLIENT
// =============================================================================

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Build a client from `LLM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        Ok(Self { http: config.http_client()?, config })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, LlmError> {
        let model = &self.config.model;
        let key = &self.config.api_key;
        match &self.config.provider {
            LlmProvider::Anthropic => anthropic::complete(&self.http, key, model, prompt).await,
            LlmProvider::OpenAi { base_url } => openai::complete(&self.http, base_url, key, model, prompt).await,
        }
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// POST `body` as JSON and return the response text of a 200 reply.
async fn post_json(request: reqwest::RequestBuilder, body: &impl Serialize) -> Result<String, LlmError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| LlmError::Transport(e.to_string()))?;
    if status != 200 {
        return Err(LlmError::Status { status, body: text });
    }
    Ok(text)
}
