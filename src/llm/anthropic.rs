//! Anthropic Messages API (`/v1/messages`).
//!
//! The prompt's system text rides in the top-level `system` field and the
//! user text is the only message. The reply's text blocks are joined;
//! thinking and any other block kinds are dropped.

use serde::{Deserialize, Serialize};

use super::types::{LlmError, Prompt};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub(crate) async fn complete(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    prompt: &Prompt<'_>,
) -> Result<String, LlmError> {
    let request = http
        .post(API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION);
    let body = super::post_json(request, &request_body(model, prompt)).await?;
    reply_text(&body)
}

// =============================================================================
// WIRE
// =============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserTurn<'a>; 1],
}

#[derive(Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesReply {
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn request_body<'a>(model: &'a str, prompt: &Prompt<'a>) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: prompt.max_tokens,
        system: prompt.system,
        messages: [UserTurn { role: "user", content: prompt.user }],
    }
}

fn reply_text(json: &str) -> Result<String, LlmError> {
    let reply: MessagesReply = serde_json::from_str(json).map_err(|e| LlmError::Decode(e.to_string()))?;
    Ok(reply
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect())
}

#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;
