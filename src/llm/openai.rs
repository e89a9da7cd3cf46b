//! OpenAI-compatible chat completions (`{base_url}/chat/completions`).
//!
//! Works against any gateway that speaks the chat-completions shape. The
//! system text becomes a leading `system` message.

use serde::{Deserialize, Serialize};

use super::types::{LlmError, Prompt};

pub(crate) async fn complete(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &Prompt<'_>,
) -> Result<String, LlmError> {
    let request = http
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key);
    let body = super::post_json(request, &request_body(model, prompt)).await?;
    reply_text(&body)
}

// =============================================================================
// WIRE
// =============================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Turn<'a>; 2],
}

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    // EDGE: null when the model refuses or only calls tools.
    content: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &Prompt<'a>) -> CompletionRequest<'a> {
    CompletionRequest {
        model,
        max_tokens: prompt.max_tokens,
        messages: [
            Turn { role: "system", content: prompt.system },
            Turn { role: "user", content: prompt.user },
        ],
    }
}

fn reply_text(json: &str) -> Result<String, LlmError> {
    let reply: CompletionReply = serde_json::from_str(json).map_err(|e| LlmError::Decode(e.to_string()))?;
    let Some(choice) = reply.choices.into_iter().next() else {
        return Err(LlmError::Decode("reply has no choices".into()));
    };
    Ok(choice.message.content.unwrap_or_default())
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
