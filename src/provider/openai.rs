//! OpenAI chat completions provider.

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
use tracing::debug;

pub const PROVIDER_NAME: &str = "openai";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant.";
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [OpenAiMessage<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI provider client
pub struct OpenAiProvider {
    client: Client,
    resolver: ConfigResolver,
    base_url: Option<String>,
}

impl OpenAiProvider {
    pub fn new(resolver: ConfigResolver) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_provider_http_client(PROVIDER_NAME)?,
            resolver,
            base_url: None,
        })
    }

    /// Override the API base URL (e.g. a compatible proxy).
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

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: [
                OpenAiMessage {
                    role: "system",
                    content: &request.system,
                },
                OpenAiMessage {
                    role: "user",
                    content: &request.input,
                },
            ],
            temperature: TEMPERATURE,
            stream,
        };

        let url = format!("{}/chat/completions", self.base_url());
        debug!(model = %request.model, stream, %url, "Calling OpenAI");
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body);
        let response = send_provider_request(PROVIDER_NAME, request, stream).await?;

        ensure_success(PROVIDER_NAME, response).await
    }
}

fn parse_stream_event(event: &Event) -> SseStep {
    let data = event.data.trim();
    if data == "[DONE]" {
        return SseStep::Done;
    }
    if data.is_empty() {
        return SseStep::Skip;
    }
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map(SseStep::Fragment)
            .unwrap_or(SseStep::Skip),
        Err(e) => SseStep::Failed(ClientError::provider(
            PROVIDER_NAME,
            format!("Failed to parse stream chunk: {}", e),
        )),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
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
        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ClientError::provider(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::provider(PROVIDER_NAME, "No choices in response"))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }

    async fn stream(&self, request: &PromptRequest) -> Result<FragmentStream, ClientError> {
        let response = self.send(request, true).await?;
        Ok(sse_fragments(PROVIDER_NAME, response, parse_stream_event))
    }
}
