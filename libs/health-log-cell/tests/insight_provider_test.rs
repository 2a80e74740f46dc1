use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use health_log_cell::models::HealthLogError;
use health_log_cell::services::insight::{GeminiInsightProvider, InsightProvider};

#[tokio::test]
async fn extracts_and_cleans_the_generated_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "**Risk Level**: low" }
                        ]
                    }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        GeminiInsightProvider::with_endpoint(format!("{}/generate", server.uri()), "test-key");

    let insight = provider
        .generate_insight("prompt text")
        .await
        .expect("a well-formed response should produce an insight");

    assert_eq!(insight, "Risk Level: low");
}

#[tokio::test]
async fn provider_failure_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider =
        GeminiInsightProvider::with_endpoint(format!("{}/generate", server.uri()), "test-key");

    let result = provider.generate_insight("prompt text").await;
    assert_matches!(result, Err(HealthLogError::Upstream(_)));
}

#[tokio::test]
async fn unexpected_response_shape_is_an_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider =
        GeminiInsightProvider::with_endpoint(format!("{}/generate", server.uri()), "test-key");

    let result = provider.generate_insight("prompt text").await;
    assert_matches!(result, Err(HealthLogError::Upstream(_)));
}
