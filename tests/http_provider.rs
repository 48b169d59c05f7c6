//! HTTP completion provider against a local mock server.

use ai_response_cache::provider::{CompletionProvider, CompletionRequest};
use ai_response_cache::{CachedClient, CompletionOptions, Error, HttpCompletionProvider, Message};
use mockito::Matcher;
use std::sync::Arc;

fn request() -> CompletionRequest {
    CompletionRequest::new(Message::prompt_pair(Some("sys"), "hello"), 500, 0.7)
}

#[tokio::test]
async fn test_parses_content_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/openai")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "max_tokens": 500,
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}],"usage":{"prompt_tokens":7,"completion_tokens":3,"total_tokens":10}}"#)
        .create_async()
        .await;

    let provider = HttpCompletionProvider::new(&format!("{}/api/openai", server.url()))
        .unwrap()
        .with_api_key("sk-test");
    let resp = provider.complete(&request()).await.unwrap();
    assert_eq!(resp.content, "hi");
    assert_eq!(resp.usage.total_tokens, 10);
    assert_eq!(resp.usage.prompt_tokens, 7);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_usage_counts_zero_tokens() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"hi"}}]}"#)
        .create_async()
        .await;

    let provider = HttpCompletionProvider::openai_compatible(&server.url()).unwrap();
    let resp = provider.complete(&request()).await.unwrap();
    assert_eq!(resp.usage.total_tokens, 0);
}

#[tokio::test]
async fn test_missing_choices_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/api/openai")
        .with_status(200)
        .with_body(r#"{"id":"x","choices":[]}"#)
        .create_async()
        .await;

    let provider = HttpCompletionProvider::new(&format!("{}/api/openai", server.url())).unwrap();
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn test_http_error_becomes_remote_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/api/openai")
        .with_status(429)
        .with_body(r#"{"error":{"message":"rate limited"}}"#)
        .create_async()
        .await;

    let provider = HttpCompletionProvider::new(&format!("{}/api/openai", server.url())).unwrap();
    match provider.complete(&request()).await {
        Err(Error::Remote { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cached_client_calls_server_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"cached answer"}}],"usage":{"total_tokens":12}}"#)
        .expect(1)
        .create_async()
        .await;

    let provider = HttpCompletionProvider::openai_compatible(&server.url()).unwrap();
    let client = CachedClient::builder()
        .provider(Arc::new(provider))
        .build()
        .await
        .unwrap();

    let first = client.complete("hello", None, CompletionOptions::default()).await.unwrap();
    let second = client.complete("hello", None, CompletionOptions::default()).await.unwrap();
    assert_eq!((first.cached, first.tokens_used), (false, 12));
    assert_eq!((second.cached, second.tokens_used), (true, 0));
    assert_eq!(second.response, "cached answer");
    mock.assert_async().await;
}
