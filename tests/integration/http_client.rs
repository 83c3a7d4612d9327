//! Chat-completions client against a fake HTTP server.

use httpmock::prelude::*;
use secrecy::Secret;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use dealscan::engine::scanner::DealScanner;
use dealscan::llm::openai::{Endpoint, OpenAiClient};
use dealscan::llm::StructuredChat;
use dealscan::types::{DealSelection, ScanError, ScrapedDeal};

const DEPLOYMENT: &str = "gpt-4o-mini";
const API_VERSION: &str = "2024-08-01-preview";

fn azure_client(server: &MockServer) -> OpenAiClient {
    let endpoint = Endpoint::Azure {
        endpoint: server.base_url(),
        deployment: DEPLOYMENT.into(),
        api_version: API_VERSION.into(),
    };
    OpenAiClient::new(endpoint, Secret::new("test-key".into()), None, Duration::from_secs(5)).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content, "refusal": null},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
    })
}

fn deal() -> ScrapedDeal {
    ScrapedDeal {
        category: "Electronics".into(),
        title: "50% Off Premium Headphones".into(),
        summary: "Half price".into(),
        url: "https://example.com/deal/headphones".into(),
        details: "Price only $69.99".into(),
        features: "Wireless".into(),
    }
}

#[tokio::test]
async fn test_azure_structured_request() {
    let server = MockServer::start_async().await;
    let content = r#"{"deals":[{"product_description":"Over-ear wireless headphones.","price":69.99,"url":"https://example.com/deal/headphones"},{"product_description":"Free gift","price":0,"url":"https://example.com/gift"}]}"#;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/openai/deployments/{DEPLOYMENT}/chat/completions"))
                .query_param("api-version", API_VERSION)
                .header("api-key", "test-key")
                .json_body_partial(
                    json!({
                        "model": DEPLOYMENT,
                        "response_format": {
                            "type": "json_schema",
                            "json_schema": {"name": "DealSelection", "strict": true}
                        }
                    })
                    .to_string(),
                );
            then.status(200).json_body(completion(content));
        })
        .await;

    let client = Arc::new(azure_client(&server));
    let scanner = DealScanner::new(client.clone());
    let selection = scanner.scan(&[deal()]).await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(selection.len(), 1);
    assert_eq!(selection.deals[0].price, 69.99);
    assert_eq!(client.total_calls(), 1);
    assert_eq!(client.total_tokens(), 150);
}

#[tokio::test]
async fn test_openai_bearer_auth() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test");
            then.status(200).json_body(completion(r#"{"deals":[]}"#));
        })
        .await;

    let endpoint = Endpoint::OpenAi { base_url: server.base_url(), model: "gpt-4o-mini".into() };
    let client = OpenAiClient::new(endpoint, Secret::new("sk-test".into()), Some(2048), Duration::from_secs(5)).unwrap();

    let text = client.complete(&DealScanner::build_request(&[deal()])).await.unwrap();
    mock.assert_async().await;
    assert_eq!(DealSelection::from_model_output(&text).unwrap(), DealSelection::default());
}

#[tokio::test]
async fn test_auth_failure_is_external_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(401).json_body(json!({
                "error": {"code": "401", "message": "Access denied due to invalid subscription key."}
            }));
        })
        .await;

    let scanner = DealScanner::new(Arc::new(azure_client(&server)));
    let err = scanner.scan(&[deal()]).await.unwrap_err();

    match err {
        ScanError::ExternalService(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("invalid subscription key"));
        }
        other => panic!("expected external service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_refusal_is_schema_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": null, "refusal": "I can't assist with that."},
                    "finish_reason": "stop"
                }]
            }));
        })
        .await;

    let scanner = DealScanner::new(Arc::new(azure_client(&server)));
    let err = scanner.scan(&[deal()]).await.unwrap_err();
    assert!(matches!(err, ScanError::SchemaValidation(_)));
}

#[tokio::test]
async fn test_empty_input_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(completion(r#"{"deals":[]}"#));
        })
        .await;

    let scanner = DealScanner::new(Arc::new(azure_client(&server)));
    assert!(scanner.scan(&[]).await.unwrap().is_none());
    assert_eq!(mock.hits_async().await, 0);
}
