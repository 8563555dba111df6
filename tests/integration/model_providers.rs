//! Integration tests for Model Provider Integration

use futures::StreamExt;
use mcp_client::error::ClientError;
use mcp_client::provider::{AnthropicProvider, LlmProvider, OpenAiProvider, PromptRequest};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::test_utils::{isolated_resolver, resolver_with_file, write_file};

fn request() -> PromptRequest {
    PromptRequest {
        model: "test-model".to_string(),
        system: "Be brief.".to_string(),
        input: "Hello".to_string(),
    }
}

async fn collect(provider: &dyn LlmProvider) -> Result<Vec<String>, ClientError> {
    let mut stream = provider.stream(&request()).await?;
    let mut fragments = Vec::new();
    while let Some(fragment) = stream.next().await {
        fragments.push(fragment?);
    }
    Ok(fragments)
}

#[tokio::test]
async fn test_openai_complete_sends_prompt_and_trims() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Hi there.\n"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(isolated_resolver(&[("OPENAI_API_KEY", "sk-test")]))
        .unwrap()
        .with_base_url(server.uri());
    assert_eq!(provider.complete(&request()).await.unwrap(), "Hi there.");
}

#[tokio::test]
async fn test_openai_stream_yields_fragments_until_done() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(isolated_resolver(&[("OPENAI_API_KEY", "sk-test")]))
        .unwrap()
        .with_base_url(server.uri());
    assert_eq!(collect(&provider).await.unwrap(), vec!["Hel", "lo"]);
}

#[tokio::test]
async fn test_openai_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(isolated_resolver(&[]))
        .unwrap()
        .with_base_url(server.uri());
    match provider.complete(&request()).await {
        Err(ClientError::MissingCredential { provider, env_var }) => {
            assert_eq!(provider, "openai");
            assert_eq!(env_var, "OPENAI_API_KEY");
        }
        other => panic!("expected MissingCredential, got {:?}", other),
    }
    assert!(matches!(
        collect(&provider).await,
        Err(ClientError::MissingCredential { .. })
    ));
}

#[tokio::test]
async fn test_openai_auth_error_is_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(isolated_resolver(&[("OPENAI_API_KEY", "bad")]))
        .unwrap()
        .with_base_url(server.uri());
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(matches!(err, ClientError::ProviderFailed { .. }));
    assert!(err.to_string().contains("Authentication failed"));
}

#[tokio::test]
async fn test_openai_key_and_base_url_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-from-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_file(
        &dir,
        "config.yaml",
        &format!(
            "openai:\n  api_key: sk-from-file\n  base_url: {}\n",
            server.uri()
        ),
    );
    let provider = OpenAiProvider::new(resolver_with_file(&config, &[])).unwrap();
    assert_eq!(provider.complete(&request()).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_anthropic_complete_sends_headers_and_system() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 1024,
            "system": "Be brief.",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": "\nHi!  "}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(isolated_resolver(&[("ANTHROPIC_API_KEY", "ak-test")]))
        .unwrap()
        .with_base_url(server.uri());
    assert_eq!(provider.complete(&request()).await.unwrap(), "Hi!");
}

#[tokio::test]
async fn test_anthropic_stream_uses_text_deltas_only() {
    let server = MockServer::start().await;
    let sse = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Good \"}}\n\n",
        "event: ping\n",
        "data: {\"type\":\"ping\"}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"day\"}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(isolated_resolver(&[("ANTHROPIC_API_KEY", "ak-test")]))
        .unwrap()
        .with_base_url(server.uri());
    assert_eq!(collect(&provider).await.unwrap(), vec!["Good ", "day"]);
}

#[tokio::test]
async fn test_anthropic_empty_content_is_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(isolated_resolver(&[("ANTHROPIC_API_KEY", "ak-test")]))
        .unwrap()
        .with_base_url(server.uri());
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(matches!(err, ClientError::ProviderFailed { ref provider, .. } if provider == "anthropic"));
}
