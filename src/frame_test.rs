use super::*;

#[test]
fn request_sets_fields() {
    let frame = Frame::request("content:snapshot", Data::new());
    assert_eq!(frame.syscall, "content:snapshot");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn done_with_correlates_to_request() {
    let req = Frame::request("content:list", Data::new());
    let mut data = Data::new();
    data.insert("items".into(), serde_json::json!([]));
    let reply = req.done_with(data);

    assert_eq!(reply.parent_id, Some(req.id));
    assert_eq!(reply.syscall, "content:list");
    assert_eq!(reply.status, Status::Done);
    assert!(reply.data.contains_key("items"));
}

#[test]
fn prefix_and_op_extraction() {
    let frame = Frame::request("content:list", Data::new());
    assert_eq!(frame.prefix(), "content");
    assert_eq!(frame.op(), "list");

    let frame = Frame::request("noseparator", Data::new());
    assert_eq!(frame.prefix(), "noseparator");
    assert_eq!(frame.op(), "");
}

#[test]
fn inbound_frame_without_data_parses() {
    let raw = r#"{"id":"00000000-0000-0000-0000-000000000001","parent_id":null,"ts":1,"syscall":"content:list","status":"request"}"#;
    let frame: Frame = serde_json::from_str(raw).expect("parse");
    assert_eq!(frame.syscall, "content:list");
    assert!(frame.data.is_empty());
}

#[test]
fn json_shape_uses_lowercase_status() {
    let frame = Frame::request("content:snapshot", Data::new()).with_data("key", "value");
    let json = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(json["status"], "request");
    assert_eq!(json["data"]["key"], "value");
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    impl ErrorCode for NotFound {
        fn error_code(&self) -> &'static str {
            "E_NOT_FOUND"
        }
    }

    let req = Frame::request("content:get", Data::new());
    let err = req.error_from(&NotFound);

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.parent_id, Some(req.id));
    assert_eq!(err.data.get("code").and_then(|v| v.as_str()), Some("E_NOT_FOUND"));
    assert_eq!(err.data.get("message").and_then(|v| v.as_str()), Some("not found"));
    assert_eq!(
        err.data
            .get("retryable")
            .and_then(serde_json::Value::as_bool),
        Some(false)
    );
}

#[test]
fn plain_error_carries_message() {
    let req = Frame::request("bogus:op", Data::new());
    let err = req.error("unknown prefix: bogus");
    assert_eq!(err.status, Status::Error);
    assert_eq!(err.data.get("message").and_then(|v| v.as_str()), Some("unknown prefix: bogus"));
}

#[test]
fn failure_is_an_error_with_no_parent() {
    let frame = Frame::failure("gateway:error", "invalid json: eof");
    assert_eq!(frame.status, Status::Error);
    assert_eq!(frame.parent_id, None);
    assert_eq!(frame.syscall, "gateway:error");
    assert_eq!(frame.data[FRAME_MESSAGE], "invalid json: eof");
}
