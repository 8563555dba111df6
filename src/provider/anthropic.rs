//! Anthropic messages provider.

use super::{
    build_provider_http_client, ensure_success, send_provider_request, sse_fragments, FragmentStream,
    LlmProvider, PromptRequest, SseStep,
};
use crate::config::ConfigResolver;
use crate::error::ClientError;
use async_trait::async_trait;
use eventsource_stream::Event;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const PROVIDER_NAME: &str = "anthropic";
pub const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic provider client
pub struct AnthropicProvider {
    client: Client,
    resolver: ConfigResolver,
    base_url: Option<String>,
}

impl AnthropicProvider {
    pub fn new(resolver: ConfigResolver) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_provider_http_client(PROVIDER_NAME)?,
            resolver,
            base_url: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn base_url(&self) -> String {
        self.base_url
            .clone()
            .or_else(|| self.resolver.provider_base_url(PROVIDER_NAME))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    async fn send(&self, request: &PromptRequest, stream: bool) -> Result<Response, ClientError> {
        let api_key = self.resolver.resolve_api_key(PROVIDER_NAME, API_KEY_ENV_VAR)?;

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: MAX_TOKENS,
            system: &request.system,
            messages: [UserMessage {
                role: "user",
                content: &request.input,
            }],
            stream,
        };

        let url = format!("{}/v1/messages", self.base_url());
        debug!(model = %request.model, stream, %url, "Calling Anthropic");
        let request = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body);
        let response = send_provider_request(PROVIDER_NAME, request, stream).await?;

        ensure_success(PROVIDER_NAME, response).await
    }
}

// Only text deltas carry output; start/stop/ping events are skipped.
fn parse_stream_event(event: &Event) -> SseStep {
    let data = event.data.trim();
    if data.is_empty() {
        return SseStep::Skip;
    }
    let parsed: StreamEvent = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            return SseStep::Failed(ClientError::provider(
                PROVIDER_NAME,
                format!("Failed to parse stream event: {}", e),
            ))
        }
    };
    match parsed.kind.as_str() {
        "content_block_delta" => parsed
            .delta
            .and_then(|delta| delta.text)
            .filter(|text| !text.is_empty())
            .map(SseStep::Fragment)
            .unwrap_or(SseStep::Skip),
        "message_stop" => SseStep::Done,
        "error" => SseStep::Failed(ClientError::provider(
            PROVIDER_NAME,
            parsed
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "stream error".to_string()),
        )),
        _ => SseStep::Skip,
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn default_system_prompt(&self) -> &str {
        DEFAULT_SYSTEM_PROMPT
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String, ClientError> {
        let response = self.send(request, false).await?;
        let completion: MessagesResponse = response.json().await.map_err(|e| {
            ClientError::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        let text = completion
            .content
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::provider(PROVIDER_NAME, "No content in response"))?
            .text
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }

    async fn stream(&self, request: &PromptRequest) -> Result<FragmentStream, ClientError> {
        let response = self.send(request, true).await?;
        Ok(sse_fragments(PROVIDER_NAME, response, parse_stream_event))
    }
}
