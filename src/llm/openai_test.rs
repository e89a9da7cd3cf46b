use super::*;
use serde_json::json;

#[test]
fn body_leads_with_system_message() {
    let prompt = Prompt { system: "be strict", user: "payload", max_tokens: 32 };
    let body = serde_json::to_value(request_body("gpt-test", &prompt)).unwrap();
    assert_eq!(
        body,
        json!({
            "model": "gpt-test",
            "max_tokens": 32,
            "messages": [
                { "role": "system", "content": "be strict" },
                { "role": "user", "content": "payload" }
            ]
        })
    );
}

#[test]
fn reply_reads_first_choice() {
    let reply = json!({
        "model": "gpt-test",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "{\"sanitizedInput\":\"a\"}" }, "finish_reason": "stop" },
            { "index": 1, "message": { "role": "assistant", "content": "ignored" }, "finish_reason": "stop" }
        ],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    });
    assert_eq!(reply_text(&reply.to_string()).unwrap(), "{\"sanitizedInput\":\"a\"}");
}

#[test]
fn null_content_reads_as_empty() {
    let reply = json!({ "choices": [{ "message": { "content": null } }] });
    assert_eq!(reply_text(&reply.to_string()).unwrap(), "");
}

#[test]
fn empty_choices_is_a_decode_error() {
    let err = reply_text(r#"{"choices":[]}"#).unwrap_err();
    assert_eq!(err.to_string(), "llm reply undecodable: reply has no choices");
}
