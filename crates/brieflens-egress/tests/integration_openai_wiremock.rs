//! Integration tests for OpenAI connector using wiremock
//!
//! These tests mock the OpenAI API to verify the egress connector's HTTP behavior.

use brieflens_core::{Family, InvocationError, InvocationRequest, OriginAllowList, Provider};
use brieflens_egress::{
    openai::{OpenAIConfig, OpenAIConnector},
    prompt::MAX_CONTENT_CHARS,
};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn connector(server: &MockServer) -> OpenAIConnector {
    OpenAIConnector::new(OpenAIConfig::new().with_base_url(server.uri())).unwrap()
}

fn request(content: &str) -> InvocationRequest {
    InvocationRequest::new(content, "en")
        .with_wire_model_id("gpt-4o-mini")
        .with_credential("test-key")
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_openai_invoke_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "max_tokens": 1024,
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "\n- one\n- two\n- three\n- four\n- five\n",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let summary = connector(&mock_server)
        .invoke(request("A page about Rust."))
        .await
        .unwrap();

    assert_eq!(summary, "- one\n- two\n- three\n- four\n- five");
}

#[tokio::test]
async fn test_openai_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error"}
        })))
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .invoke(request("content"))
        .await
        .unwrap_err();

    match err {
        InvocationError::Status {
            status_code,
            message,
        } => {
            assert_eq!(status_code, 401);
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_server_error_not_retried_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .invoke(request("content"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        InvocationError::Status {
            status_code: 503,
            message: "overloaded".to_string()
        }
    );
}

#[tokio::test]
async fn test_openai_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .invoke(request("content"))
        .await
        .unwrap_err();

    assert!(matches!(err, InvocationError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_missing_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "x", "choices": []})),
        )
        .mount(&mock_server)
        .await;

    let err = connector(&mock_server)
        .invoke(request("content"))
        .await
        .unwrap_err();

    assert!(matches!(err, InvocationError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_missing_credential_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- x")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = InvocationRequest::new("content", "en").with_wire_model_id("gpt-4o-mini");
    let err = connector(&mock_server).invoke(request).await.unwrap_err();

    assert_eq!(
        err,
        InvocationError::MissingCredential {
            family: Family::OpenAI
        }
    );
}

#[tokio::test]
async fn test_openai_permission_denied_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- x")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let gate = Arc::new(OriginAllowList::new(["https://api.openai.com"]));
    let connector = connector(&mock_server).with_permissions(gate);
    let err = connector.invoke(request("content")).await.unwrap_err();

    match err {
        InvocationError::PermissionDenied { origin } => {
            assert_eq!(origin, mock_server.uri());
        }
        other => panic!("expected permission error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_granted_origin_is_allowed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- granted")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gate = Arc::new(OriginAllowList::new([mock_server.uri()]));
    let summary = connector(&mock_server)
        .with_permissions(gate)
        .invoke(request("content"))
        .await
        .unwrap();

    assert_eq!(summary, "- granted");
}

#[tokio::test]
async fn test_openai_prompt_truncates_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("- short")))
        .mount(&mock_server)
        .await;

    let content = format!("{}OVERFLOW", "x".repeat(MAX_CONTENT_CHARS));
    connector(&mock_server)
        .invoke(request(&content))
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();

    assert!(prompt.ends_with(&"x".repeat(MAX_CONTENT_CHARS)));
    assert!(!prompt.contains("OVERFLOW"));
}
