//! Integration tests for single and batch invocation

use async_trait::async_trait;
use mcp_client::config::ConfigResolver;
use mcp_client::context::Context;
use mcp_client::error::ClientError;
use mcp_client::invocation::{CaptureSink, Orchestrator};
use mcp_client::provider::{FragmentStream, LlmProvider, PromptRequest, ProviderRegistry};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::test_utils::{isolated_resolver, resolver_with_file, write_file};

/// Provider that answers from the prompt itself. Inputs containing "fail" error.
struct EchoProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmProvider for EchoProvider {
    fn provider_name(&self) -> &str {
        "echo"
    }

    fn default_model(&self) -> &str {
        "echo-1"
    }

    fn default_system_prompt(&self) -> &str {
        "echo system"
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.input.contains("fail") {
            return Err(ClientError::provider("echo", "scripted failure"));
        }
        Ok(format!("  [{}|{}] {}  ", request.model, request.system, request.input))
    }

    async fn stream(&self, request: &PromptRequest) -> Result<FragmentStream, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.input.contains("fail") {
            return Err(ClientError::provider("echo", "scripted failure"));
        }
        let fragments: Vec<Result<String, ClientError>> = request
            .input
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

fn orchestrator(calls: &Arc<AtomicUsize>) -> Orchestrator {
    let mut registry = ProviderRegistry::builtin(isolated_resolver(&[]));
    let calls = Arc::clone(calls);
    registry.register("echo", move |_: &ConfigResolver| {
        Ok(Box::new(EchoProvider {
            calls: Arc::clone(&calls),
        }) as Box<dyn LlmProvider>)
    });
    Orchestrator::new(registry)
}

fn context() -> Context {
    Context::from_value(json!({
        "context_name": "echoer",
        "body": {"model": "m-1", "description": "sys"}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_run_once_buffered_returns_trimmed_text() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = CaptureSink::default();
    let output = orchestrator(&calls)
        .run_once("echo", context(), "hi", false, None, &mut sink)
        .await
        .unwrap();
    assert_eq!(output, "[m-1|sys] hi");
    assert!(sink.fragments.is_empty());
}

#[tokio::test]
async fn test_run_once_stream_forwards_fragments_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = CaptureSink::default();
    let output = orchestrator(&calls)
        .run_once("echo", context(), "one two three", true, None, &mut sink)
        .await
        .unwrap();
    assert_eq!(output, "");
    assert_eq!(sink.fragments, vec!["one ", "two ", "three"]);
    assert_eq!(sink.text(), "one two three");
    assert_eq!(sink.streams_ended, 1);
}

#[tokio::test]
async fn test_model_override_applies_and_creates_body() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = orchestrator(&calls);
    let mut sink = CaptureSink::default();

    let output = orchestrator
        .run_once("echo", context(), "x", false, Some("m-2"), &mut sink)
        .await
        .unwrap();
    assert_eq!(output, "[m-2|sys] x");

    let bare = Context::from_value(json!({"context_name": "bare"})).unwrap();
    let output = orchestrator
        .run_once("echo", bare, "x", false, Some("m-3"), &mut sink)
        .await
        .unwrap();
    assert_eq!(output, "[m-3|echo system] x");
}

#[tokio::test]
async fn test_unknown_provider_fails_before_any_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = CaptureSink::default();
    let err = orchestrator(&calls)
        .run_batch(
            "gemini",
            &context(),
            &["a".to_string()],
            false,
            &mut sink,
        )
        .await
        .unwrap_err();
    match err {
        ClientError::UnknownProvider { name, known } => {
            assert_eq!(name, "gemini");
            assert_eq!(known, "anthropic, echo, openai");
        }
        other => panic!("expected UnknownProvider, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(sink.started.is_empty());
}

#[tokio::test]
async fn test_batch_continues_past_failures_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = CaptureSink::default();
    let inputs: Vec<String> = ["first", "please fail", "third"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let report = orchestrator(&calls)
        .run_batch("echo", &context(), &inputs, false, &mut sink)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded(), 2);
    let outputs: Vec<&str> = report.items.iter().map(|i| i.output.as_str()).collect();
    assert_eq!(outputs, vec!["[m-1|sys] first", "[m-1|sys] third"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].input, "please fail");

    let started: Vec<usize> = sink.started.iter().map(|(i, _)| *i).collect();
    assert_eq!(started, vec![1, 2, 3]);
    assert_eq!(sink.failed, vec![2]);
    assert_eq!(sink.outputs.len(), 2);
}

#[tokio::test]
async fn test_batch_stream_mode_records_only_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut sink = CaptureSink::default();
    let inputs = vec!["a b".to_string(), "fail".to_string()];

    let report = orchestrator(&calls)
        .run_batch("echo", &context(), &inputs, true, &mut sink)
        .await
        .unwrap();

    assert!(report.items.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(sink.text(), "a b");
    assert_eq!(sink.streams_ended, 1);
}

#[tokio::test]
async fn test_batch_missing_credential_fails_each_item_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_file(
        &dir,
        "config.yaml",
        &format!("openai:\n  base_url: {}\n", server.uri()),
    );
    let orchestrator = Orchestrator::new(ProviderRegistry::builtin(resolver_with_file(&config, &[])));
    let mut sink = CaptureSink::default();
    let inputs = vec!["a".to_string(), "b".to_string()];

    let report = orchestrator
        .run_batch("openai", &context(), &inputs, false, &mut sink)
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|f| matches!(f.error, ClientError::MissingCredential { .. })));
}
