//! Model Provider Abstraction
//!
//! Uniform interface over the LLM backends a context can be run against. A
//! provider turns a context plus one user input into either a complete response
//! or a stream of text fragments. Credentials are resolved on every call, so a
//! missing key fails that call before any network traffic.

use crate::config::ConfigResolver;
use crate::context::Context;
use crate::error::ClientError;
use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::{future, stream, Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Streaming completion type: text fragments in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Constructor stored in a [`ProviderRegistry`]
pub type ProviderConstructor =
    Arc<dyn Fn(&ConfigResolver) -> Result<Box<dyn LlmProvider>, ClientError> + Send + Sync>;

/// Prompt assembled from a context and one user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub model: String,
    pub system: String,
    pub input: String,
}

impl PromptRequest {
    /// Model from `body.model`, system text from `body.description`, each
    /// falling back to the provider default.
    pub fn from_context(
        context: &Context,
        input: &str,
        default_model: &str,
        default_system: &str,
    ) -> Self {
        Self {
            model: context.model().unwrap_or(default_model).to_string(),
            system: context.description().unwrap_or(default_system).to_string(),
            input: input.to_string(),
        }
    }
}

/// LLM provider client trait
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry name (e.g. "openai")
    fn provider_name(&self) -> &str;

    /// Model used when the context names none
    fn default_model(&self) -> &str;

    /// System text used when the context has no description
    fn default_system_prompt(&self) -> &str;

    fn prompt(&self, context: &Context, input: &str) -> PromptRequest {
        PromptRequest::from_context(
            context,
            input,
            self.default_model(),
            self.default_system_prompt(),
        )
    }

    /// Complete response text, whitespace-trimmed
    async fn complete(&self, request: &PromptRequest) -> Result<String, ClientError>;

    /// Incremental response fragments
    async fn stream(&self, request: &PromptRequest) -> Result<FragmentStream, ClientError>;
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Longest silence tolerated between two events of a streamed response.
const PROVIDER_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

// No client-wide timeout: it would also cap how long a stream may run.
pub(crate) fn build_provider_http_client(provider: &str) -> Result<Client, ClientError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ClientError::provider(provider, format!("Failed to create HTTP client: {}", e)))
}

/// Send a provider request.
///
/// Buffered calls are bounded end to end. Streamed calls are bounded only until
/// the response headers arrive; after that [`sse_fragments`] enforces an idle
/// timeout between events.
pub(crate) async fn send_provider_request(
    provider: &str,
    request: RequestBuilder,
    stream: bool,
) -> Result<Response, ClientError> {
    if !stream {
        return request
            .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| map_http_error(provider, e));
    }
    tokio::time::timeout(PROVIDER_HTTP_REQUEST_TIMEOUT, request.send())
        .await
        .map_err(|_| {
            ClientError::provider(
                provider,
                format!(
                    "Request timeout: no response within {}s",
                    PROVIDER_HTTP_REQUEST_TIMEOUT.as_secs()
                ),
            )
        })?
        .map_err(|e| map_http_error(provider, e))
}

// Helper function to map transport errors
pub(crate) fn map_http_error(provider: &str, error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::provider(provider, format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ClientError::provider(provider, format!("Connection error: {}", error))
    } else {
        ClientError::provider(provider, format!("HTTP error: {}", error))
    }
}

/// Pass a 2xx response through; turn anything else into `ProviderFailed`.
pub(crate) async fn ensure_success(
    provider: &str,
    response: Response,
) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let cause = match status.as_u16() {
        401 => format!("Authentication failed: {}", error_text),
        429 => format!("Rate limit exceeded: {}", error_text),
        404 => format!("Model not found: {}", error_text),
        code => format!("Request failed with status {}: {}", code, error_text),
    };
    Err(ClientError::provider(provider, cause))
}

/// Outcome of interpreting one server-sent event
#[derive(Debug)]
pub(crate) enum SseStep {
    Fragment(String),
    Skip,
    Done,
    Failed(ClientError),
}

/// Turn an SSE response into a fragment stream using a per-provider event parser.
///
/// The stream ends at the first `Done` step or when the server closes the body.
pub(crate) fn sse_fragments(
    provider: &'static str,
    response: Response,
    parse: fn(&Event) -> SseStep,
) -> FragmentStream {
    event_fragments(
        provider,
        response.bytes_stream(),
        parse,
        PROVIDER_STREAM_IDLE_TIMEOUT,
    )
}

fn event_fragments<S, B, E>(
    provider: &'static str,
    body: S,
    parse: fn(&Event) -> SseStep,
    idle_timeout: Duration,
) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let events = Box::pin(body.eventsource());
    let fragments = stream::unfold(Some(events), move |state| async move {
        let mut events = match state {
            Some(events) => events,
            None => return None,
        };
        match tokio::time::timeout(idle_timeout, events.next()).await {
            Ok(Some(Ok(event))) => Some((parse(&event), Some(events))),
            Ok(Some(Err(e))) => Some((
                SseStep::Failed(ClientError::provider(provider, format!("Stream error: {}", e))),
                Some(events),
            )),
            Ok(None) => None,
            // Report the stall once, then end the stream.
            Err(_) => Some((
                SseStep::Failed(ClientError::provider(
                    provider,
                    format!("Stream idle for more than {}s", idle_timeout.as_secs()),
                )),
                None,
            )),
        }
    })
    .take_while(|step| future::ready(!matches!(step, SseStep::Done)))
    .filter_map(|step| {
        future::ready(match step {
            SseStep::Fragment(text) => Some(Ok(text)),
            SseStep::Failed(err) => Some(Err(err)),
            SseStep::Skip | SseStep::Done => None,
        })
    });
    Box::pin(fragments)
}

/// Name-keyed table of provider constructors
///
/// Built-ins are registered by [`ProviderRegistry::builtin`]; further providers can
/// be added with [`ProviderRegistry::register`] without touching the orchestrator.
#[derive(Clone)]
pub struct ProviderRegistry {
    resolver: ConfigResolver,
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            resolver,
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with the OpenAI and Anthropic providers.
    pub fn builtin(resolver: ConfigResolver) -> Self {
        let mut registry = Self::new(resolver);
        registry.register(openai::PROVIDER_NAME, |resolver: &ConfigResolver| {
            Ok(Box::new(OpenAiProvider::new(resolver.clone())?) as Box<dyn LlmProvider>)
        });
        registry.register(anthropic::PROVIDER_NAME, |resolver: &ConfigResolver| {
            Ok(Box::new(AnthropicProvider::new(resolver.clone())?) as Box<dyn LlmProvider>)
        });
        registry
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&ConfigResolver) -> Result<Box<dyn LlmProvider>, ClientError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_string(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    fn unknown(&self, name: &str) -> ClientError {
        ClientError::UnknownProvider {
            name: name.to_string(),
            known: self.names().join(", "),
        }
    }

    /// Fail with `UnknownProvider` unless `name` is registered.
    pub fn validate(&self, name: &str) -> Result<(), ClientError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(self.unknown(name))
        }
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn LlmProvider>, ClientError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| self.unknown(name))?;
        constructor(&self.resolver)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
