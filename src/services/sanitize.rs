//! Sanitize — hosted-model rewrite of user text before it is stored.
//!
//! DESIGN
//! ======
//! One call sends `{"userInput": ...}` and expects `{"sanitizedInput": ...}`
//! back as the model's whole reply. Transport errors, unparseable replies and
//! blank results all count as a failed attempt. Attempts are bounded and
//! spaced with linear backoff (`attempt * base`). No sleep follows the final
//! attempt; its error is surfaced. Configuration may lower the attempt bound
//! but never raise it above three.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::frame::ErrorCode;
use crate::llm::types::{LlmChat, LlmError, Prompt};

/// Hard ceiling on attempts per sanitization.
const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 1000;
const DEFAULT_MAX_TOKENS: u32 = 1024;

const SYSTEM_PROMPT: &str = "You are an expert in preventing injection attacks. Sanitize the user \
input you are given to prevent any kind of injection attack, including but not limited to SQL \
injection, XSS, and command injection. The input arrives as a JSON object {\"userInput\": string}. \
Reply with only a JSON object {\"sanitizedInput\": string} holding the sanitized input, and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeConfig {
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub max_tokens: u32,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            retry_base_ms: DEFAULT_RETRY_BASE_MS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl SanitizeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_attempts: crate::env_parse("SANITIZE_MAX_ATTEMPTS", MAX_ATTEMPTS).clamp(1, MAX_ATTEMPTS),
            retry_base_ms: crate::env_parse("SANITIZE_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS),
            max_tokens: crate::env_parse("SANITIZE_MAX_TOKENS", DEFAULT_MAX_TOKENS),
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("sanitizer reply was not a sanitizedInput object: {0}")]
    Malformed(String),
    #[error("sanitizer returned empty text")]
    Empty,
    #[error("sanitization failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<SanitizeError> },
}

impl ErrorCode for SanitizeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Llm(e) => e.error_code(),
            Self::Malformed(_) => "E_SANITIZE_MALFORMED",
            Self::Empty => "E_SANITIZE_EMPTY",
            Self::Exhausted { .. } => "E_SANITIZE_FAILED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Llm(e) => e.retryable(),
            Self::Exhausted { .. } => true,
            Self::Malformed(_) | Self::Empty => false,
        }
    }
}

// =============================================================================
// WIRE SHAPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SanitizeRequest<'a> {
    user_input: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SanitizeReply {
    sanitized_input: String,
}

// =============================================================================
// SANITIZE
// =============================================================================

/// Sanitize `input`, retrying on failure.
///
/// # Errors
///
/// Returns [`SanitizeError::Exhausted`] carrying the last failure once every
/// attempt has failed.
pub async fn sanitize(llm: &dyn LlmChat, config: SanitizeConfig, input: &str) -> Result<String, SanitizeError> {
    let attempts = config.max_attempts.clamp(1, MAX_ATTEMPTS);
    let mut last = SanitizeError::Empty;

    for attempt in 1..=attempts {
        match sanitize_once(llm, config.max_tokens, input).await {
            Ok(text) => {
                info!(attempt, chars = text.chars().count(), "sanitize: ok");
                return Ok(text);
            }
            Err(e) => {
                warn!(attempt, total = attempts, error = %e, "sanitize: attempt failed");
                last = e;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(Duration::from_millis(u64::from(attempt) * config.retry_base_ms)).await;
        }
    }

    Err(SanitizeError::Exhausted { attempts, last: Box::new(last) })
}

async fn sanitize_once(llm: &dyn LlmChat, max_tokens: u32, input: &str) -> Result<String, SanitizeError> {
    let payload = serde_json::to_string(&SanitizeRequest { user_input: input })
        .map_err(|e| SanitizeError::Malformed(e.to_string()))?;
    let reply = llm
        .complete(&Prompt { system: SYSTEM_PROMPT, user: &payload, max_tokens })
        .await?;
    parse_sanitized(&reply)
}

/// Extract `sanitizedInput` from a model reply, tolerating a code fence.
pub(crate) fn parse_sanitized(reply: &str) -> Result<String, SanitizeError> {
    let body = strip_code_fence(reply.trim());
    let parsed: SanitizeReply = serde_json::from_str(body).map_err(|e| SanitizeError::Malformed(e.to_string()))?;
    let text = parsed.sanitized_input.trim();
    if text.is_empty() {
        return Err(SanitizeError::Empty);
    }
    Ok(text.to_string())
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // EDGE: optional language tag on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
#[path = "sanitize_test.rs"]
mod tests;
