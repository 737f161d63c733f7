use std::collections::HashMap;

use soia::{HandlerError, Service};
use soia_core::primitive;
use soia_core::{Descriptor, PrimitiveKind, Serializer};

fn int32_serializer() -> &'static Serializer<i32> {
    static SERIALIZER: Serializer<i32> = Serializer {
        descriptor: || Descriptor::Primitive(PrimitiveKind::Int32),
        encode: |v, out| primitive::encode_int32(out, *v),
        decode: |r, _keep| primitive::decode_int32(r),
        to_json: |v, _flavor| primitive::int32_to_json(*v),
        from_json: |v, _keep| primitive::int32_from_json(v),
        is_default: |v| *v == 0,
        default: || 0,
    };
    &SERIALIZER
}

fn double_service() -> Service {
    Service::builder()
        .with_method("double", 1, int32_serializer(), int32_serializer(), |n: i32| async move { Ok(n * 2) })
        .unwrap()
        .with_method("explode", 2, int32_serializer(), int32_serializer(), |_n: i32| async move {
            Err(HandlerError::Handler("boom".to_string()))
        })
        .unwrap()
        .build()
}

#[tokio::test]
async fn string_envelope_dispatches_by_name() {
    let service = double_service();
    let response = service.handle_request("double::readable:21", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "42");
}

#[tokio::test]
async fn string_envelope_dispatches_by_number_when_name_empty() {
    let service = double_service();
    let response = service.handle_request(":1:readable:10", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "20");
}

#[tokio::test]
async fn json_envelope_dispatches_and_forces_readable() {
    let service = double_service();
    let response = service.handle_request(r#"{"method": "double", "request": 5}"#, &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "10");
}

#[tokio::test]
async fn json_envelope_accepts_numeric_method() {
    let service = double_service();
    let response = service.handle_request(r#"{"method": 1, "request": 3}"#, &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "6");
}

#[tokio::test]
async fn empty_body_lists_methods() {
    let service = double_service();
    let response = service.handle_request("", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "application/json");
    assert!(response.body.contains("double"));
    assert!(response.body.contains("explode"));
}

#[tokio::test]
async fn list_keyword_lists_methods() {
    let service = double_service();
    let response = service.handle_request("list", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert!(response.body.contains("double"));
}

#[tokio::test]
async fn debug_keyword_returns_html() {
    let service = double_service();
    let response = service.handle_request("debug", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/html; charset=utf-8");
    assert!(response.body.contains("<html>"));
}

#[tokio::test]
async fn unknown_method_name_is_400() {
    let service = double_service();
    let response = service.handle_request("triple::readable:1", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn malformed_request_body_is_400() {
    let service = double_service();
    let response = service.handle_request(r#"double::readable:"not a number""#, &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn handler_failure_is_500() {
    let service = double_service();
    let response = service.handle_request("explode::readable:1", &HashMap::new(), Some(true)).await;
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn duplicate_method_number_fails_at_build_time() {
    let result = Service::builder()
        .with_method("double", 1, int32_serializer(), int32_serializer(), |n: i32| async move { Ok(n) })
        .unwrap()
        .with_method("twice", 1, int32_serializer(), int32_serializer(), |n: i32| async move { Ok(n) });
    assert!(result.is_err());
}
