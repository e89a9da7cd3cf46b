//! LLM types — the one-shot prompt the sanitizer sends and the errors it can see.
//!
//! The sanitizer asks a single question per attempt and reads back plain
//! text, so the seam is a prompt in and a string out. Provider wire formats
//! stay private to `anthropic` and `openai`.

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm config invalid: {0}")]
    Config(String),

    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("llm client build failed: {0}")]
    ClientBuild(String),

    /// The request never produced a response (connect, timeout, body read).
    #[error("llm transport failed: {0}")]
    Transport(String),

    #[error("llm provider returned status {status}")]
    Status { status: u16, body: String },

    /// The provider answered 200 but not in the shape it documents.
    #[error("llm reply undecodable: {0}")]
    Decode(String),
}

impl crate::frame::ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E_LLM_CONFIG",
            Self::MissingApiKey { .. } => "E_LLM_MISSING_KEY",
            Self::ClientBuild(_) => "E_LLM_CLIENT_BUILD",
            Self::Transport(_) => "E_LLM_TRANSPORT",
            Self::Status { .. } => "E_LLM_STATUS",
            Self::Decode(_) => "E_LLM_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// PROMPT
// =============================================================================

/// A single-turn prompt: system instructions plus one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
}

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// Provider-neutral completion. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// Send `prompt` and return the model's reply text, text blocks joined.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the reply cannot be decoded.
    async fn complete(&self, prompt: &Prompt<'_>) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
