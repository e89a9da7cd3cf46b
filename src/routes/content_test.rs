use super::*;
use crate::llm::types::LlmError;
use crate::routes::StaticDirs;
use crate::routes::test_server::spawn;
use crate::services::sanitize::SanitizeError;
use crate::state::test_helpers::{MockLlm, escaped, harness, harness_with_llm};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

fn text_form(content: &str) -> Form {
    Form::new().text("content", content.to_string())
}

fn image_form(content: &str) -> Form {
    let part = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("cat.png")
        .mime_str("image/png")
        .unwrap();
    text_form(content).part("image", part)
}

async fn server(state: AppState) -> String {
    let addr = spawn(state, StaticDirs::default()).await;
    format!("http://{addr}")
}

// =============================================================================
// STATUS MAPPING
// =============================================================================

#[test]
fn form_error_statuses() {
    let cases = [
        (FormError::Validation(ValidationError::EmptyContent), StatusCode::BAD_REQUEST),
        (FormError::Validation(ValidationError::ContentTooLong { max: 1, actual: 2 }), StatusCode::PAYLOAD_TOO_LARGE),
        (FormError::Validation(ValidationError::ImageTooLarge { max: 1, actual: 2 }), StatusCode::PAYLOAD_TOO_LARGE),
        (
            FormError::RateLimit(crate::rate_limit::RateLimitError::GlobalExceeded { limit: 1, window_secs: 60 }),
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (FormError::Sanitize(SanitizeError::Empty), StatusCode::BAD_GATEWAY),
        (FormError::Media(crate::media::MediaError::Request("x".into())), StatusCode::BAD_GATEWAY),
        (FormError::SanitizerNotConfigured, StatusCode::SERVICE_UNAVAILABLE),
        (FormError::MediaNotConfigured, StatusCode::SERVICE_UNAVAILABLE),
        (FormError::Content(ContentError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND),
        (FormError::Content(ContentError::Database(sqlx::Error::PoolTimedOut)), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
        assert_eq!(form_error_to_status(&err), status, "{err}");
    }
}

#[test]
fn api_error_carries_code_and_retryable() {
    let err = ApiError::from(FormError::SanitizerNotConfigured);
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.body["code"], "E_SANITIZER_NOT_CONFIGURED");
    assert_eq!(err.body["message"], "sanitizer not configured");
    assert_eq!(err.body["retryable"], false);
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn create_then_get_and_list() {
    let h = harness();
    let base = server(h.state.clone()).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{base}/api/content"))
        .multipart(text_form("<i>first</i>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED.as_u16());
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["text"], escaped("<i>first</i>"));
    assert!(created.get("imageUrl").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    let fetched: Value = http
        .get(format!("{base}/api/content/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], created["id"]);

    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    http.post(format!("{base}/api/content"))
        .multipart(text_form("second"))
        .send()
        .await
        .unwrap();

    let listed: Vec<Value> = http
        .get(format!("{base}/api/content"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["text"], "second");
    assert_eq!(listed[1]["id"], created["id"]);
}

#[tokio::test]
async fn create_with_image_returns_image_fields() {
    let h = harness();
    let base = server(h.state.clone()).await;

    let created: Value = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(image_form("pic"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(created["imageUrl"].as_str().unwrap().starts_with("https://media.test/"));
    assert_eq!(h.media.stored(), vec![created["imagePath"].as_str().unwrap().to_string()]);
}

#[tokio::test]
async fn empty_content_is_bad_request() {
    let h = harness();
    let base = server(h.state.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(text_form("   "))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST.as_u16());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_EMPTY_CONTENT");
    assert_eq!(body["message"], "Please enter some content.");
    assert_eq!(body["retryable"], false);
    assert_eq!(h.store.call_count(), 0);
}

#[tokio::test]
async fn missing_content_field_is_malformed() {
    let h = harness();
    let base = server(h.state.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(Form::new().text("other", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST.as_u16());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_MALFORMED_FORM");
}

#[tokio::test]
async fn empty_image_part_means_no_image() {
    let h = harness();
    let base = server(h.state.clone()).await;
    let empty = Part::bytes(Vec::new()).file_name("").mime_str("application/octet-stream").unwrap();

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(text_form("text only").part("image", empty))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED.as_u16());
    assert_eq!(h.media.upload_count(), 0);
}

#[tokio::test]
async fn image_without_media_store_is_unavailable() {
    let mut h = harness();
    h.state.media = None;
    let base = server(h.state.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(image_form("pic"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE.as_u16());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_MEDIA_NOT_CONFIGURED");
}

#[tokio::test]
async fn sanitizer_failure_is_bad_gateway() {
    let h = harness_with_llm(MockLlm::new(
        (0..3).map(|_| Err(LlmError::Status { status: 500, body: String::new() })).collect(),
    ));
    let base = server(h.state.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/content"))
        .multipart(text_form("hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY.as_u16());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_SANITIZE_FAILED");
    assert_eq!(body["retryable"], true);
    assert_eq!(h.store.record_count(), 0);
}

#[tokio::test]
async fn patch_then_delete() {
    let h = harness();
    let base = server(h.state.clone()).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("{base}/api/content"))
        .multipart(image_form("before"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let resp = http
        .patch(format!("{base}/api/content/{id}"))
        .multipart(text_form("after"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK.as_u16());
    let edited: Value = resp.json().await.unwrap();
    assert_eq!(edited["text"], "after");
    assert_eq!(edited["imagePath"], created["imagePath"]);

    let resp = http.delete(format!("{base}/api/content/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT.as_u16());
    assert!(h.media.stored().is_empty());

    let resp = http.get(format!("{base}/api/content/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND.as_u16());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_CONTENT_NOT_FOUND");
}

#[tokio::test]
async fn empty_patch_is_rejected_before_lookup() {
    let h = harness();
    let base = server(h.state.clone()).await;

    let resp = reqwest::Client::new()
        .patch(format!("{base}/api/content/{}", Uuid::new_v4()))
        .multipart(text_form(""))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST.as_u16());
    assert_eq!(h.store.call_count(), 0);
}

#[tokio::test]
async fn healthz_is_ok() {
    let h = harness();
    let base = server(h.state.clone()).await;
    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK.as_u16());
}

#[tokio::test]
async fn static_page_is_served_from_web_dir() {
    let dir = std::env::temp_dir().join(format!("formflow-web-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("index.html"), "<h1>FormFlow</h1>").await.unwrap();

    let h = harness();
    let addr = spawn(h.state.clone(), StaticDirs { web_dir: dir.clone(), media_dir: None }).await;
    let body = reqwest::get(format!("http://{addr}/")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "<h1>FormFlow</h1>");

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
