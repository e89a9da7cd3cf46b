use super::*;

// =============================================================================
// sign_params
// =============================================================================

#[test]
fn signature_matches_known_digest() {
    let sig = sign_params(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd");
    assert_eq!(sig, "0d4fe14b2b4a3f68a97ccc5097c43908b623d24293c296826a9390c14d891509");
}

#[test]
fn signature_is_order_independent() {
    let a = sign_params(&[("public_id", "x"), ("timestamp", "1")], "secret");
    let b = sign_params(&[("timestamp", "1"), ("public_id", "x")], "secret");
    assert_eq!(a, b);
}

#[test]
fn signature_depends_on_secret() {
    let a = sign_params(&[("public_id", "x")], "one");
    let b = sign_params(&[("public_id", "x")], "two");
    assert_ne!(a, b);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_input_hashes_to_sha256_of_empty_string() {
    assert_eq!(sign_params(&[], ""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
}

// =============================================================================
// parse_upload_response
// =============================================================================

#[test]
fn upload_response_yields_url_and_public_id() {
    let json = serde_json::json!({
        "asset_id": "a1",
        "public_id": "formflow/abc123",
        "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/formflow/abc123.png",
        "url": "http://res.cloudinary.com/demo/image/upload/v1/formflow/abc123.png",
        "bytes": 1024
    })
    .to_string();
    let stored = parse_upload_response(&json).unwrap();
    assert_eq!(stored.path, "formflow/abc123");
    assert!(stored.url.starts_with("https://"));
}

#[test]
fn upload_response_without_secure_url_is_parse_error() {
    let json = serde_json::json!({ "public_id": "x" }).to_string();
    assert!(matches!(parse_upload_response(&json), Err(MediaError::Parse(_))));
}

// =============================================================================
// parse_destroy_response
// =============================================================================

#[test]
fn destroy_ok_is_deleted() {
    assert_eq!(parse_destroy_response(r#"{"result":"ok"}"#).unwrap(), DeleteOutcome::Deleted);
}

#[test]
fn destroy_not_found_is_success() {
    assert_eq!(parse_destroy_response(r#"{"result":"not found"}"#).unwrap(), DeleteOutcome::AlreadyAbsent);
}

#[test]
fn destroy_other_result_is_error() {
    let err = parse_destroy_response(r#"{"result":"error"}"#).unwrap_err();
    assert!(matches!(err, MediaError::DeleteRejected(ref r) if r == "error"));
}

#[test]
fn destroy_garbage_is_parse_error() {
    assert!(matches!(parse_destroy_response("<html>"), Err(MediaError::Parse(_))));
}

#[test]
fn endpoint_includes_cloud_name() {
    let settings = CloudinarySettings {
        base_url: "https://api.cloudinary.com/v1_1".into(),
        cloud_name: "demo".into(),
        upload_preset: "p".into(),
        api_key: "k".into(),
        api_secret: "s".into(),
    };
    let client = CloudinaryClient::new(settings, 5).unwrap();
    assert_eq!(client.endpoint("destroy"), "https://api.cloudinary.com/v1_1/demo/image/destroy");
}
