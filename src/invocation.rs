//! Invocation: run a context against a provider, once or over a batch of inputs.
//!
//! Output is pushed into an [`OutputSink`] so that streamed fragments reach the
//! caller as they arrive. Batch runs are strictly sequential and never abort on a
//! single failed input.

use crate::context::Context;
use crate::error::ClientError;
use crate::provider::{LlmProvider, ProviderRegistry};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Receiver for invocation output
pub trait OutputSink {
    /// One streamed fragment, in arrival order.
    fn fragment(&mut self, text: &str);

    /// Called once a stream finishes, successfully or not.
    fn end_stream(&mut self) {}

    fn begin_item(&mut self, _index: usize, _input: &str) {}

    /// Buffered output of a batch item.
    fn item_output(&mut self, _index: usize, _output: &str) {}

    fn item_failed(&mut self, _index: usize, _error: &ClientError) {}
}

/// Sink that records everything it receives.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaptureSink {
    pub fragments: Vec<String>,
    pub streams_ended: usize,
    pub started: Vec<(usize, String)>,
    pub outputs: Vec<(usize, String)>,
    pub failed: Vec<usize>,
}

impl CaptureSink {
    /// Concatenated fragments.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

impl OutputSink for CaptureSink {
    fn fragment(&mut self, text: &str) {
        self.fragments.push(text.to_string());
    }

    fn end_stream(&mut self) {
        self.streams_ended += 1;
    }

    fn begin_item(&mut self, index: usize, input: &str) {
        self.started.push((index, input.to_string()));
    }

    fn item_output(&mut self, index: usize, output: &str) {
        self.outputs.push((index, output.to_string()));
    }

    fn item_failed(&mut self, index: usize, _error: &ClientError) {
        self.failed.push(index);
    }
}

/// One successful buffered batch result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub input: String,
    pub output: String,
}

/// One failed batch input (1-based index)
#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub input: String,
    pub error: ClientError,
}

impl ItemFailure {
    pub fn into_error(self) -> ClientError {
        ClientError::ItemFailed {
            index: self.index,
            cause: Box::new(self.error),
        }
    }
}

/// Result of a batch run. Streamed batches record failures only.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub items: Vec<BatchItem>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// Run one input through `provider`.
///
/// Streaming forwards fragments to `sink` and returns an empty string. Buffered
/// mode returns the trimmed response.
pub async fn dispatch(
    provider: &dyn LlmProvider,
    context: &Context,
    input: &str,
    stream: bool,
    sink: &mut dyn OutputSink,
) -> Result<String, ClientError> {
    let request = provider.prompt(context, input);
    debug!(
        provider = provider.provider_name(),
        model = %request.model,
        stream,
        "Dispatching prompt"
    );

    if !stream {
        return Ok(provider.complete(&request).await?.trim().to_string());
    }

    let mut fragments = provider.stream(&request).await?;
    let mut outcome = Ok(String::new());
    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => sink.fragment(&text),
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }
    sink.end_stream();
    outcome
}

/// Provider-agnostic runner for single and batch invocations
#[derive(Debug, Clone)]
pub struct Orchestrator {
    providers: ProviderRegistry,
}

impl Orchestrator {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Single invocation. `model_override` replaces `body.model`, creating `body`
    /// when absent.
    pub async fn run_once(
        &self,
        provider_name: &str,
        mut context: Context,
        input: &str,
        stream: bool,
        model_override: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<String, ClientError> {
        let provider = self.providers.create(provider_name)?;
        if let Some(model) = model_override {
            context.set_model(model);
        }
        info!(provider = provider_name, stream, "Running context");
        dispatch(provider.as_ref(), &context, input, stream, sink).await
    }

    /// Sequential batch invocation. Per-input failures are recorded and skipped;
    /// only an unknown provider name fails the whole batch.
    pub async fn run_batch(
        &self,
        provider_name: &str,
        context: &Context,
        inputs: &[String],
        stream: bool,
        sink: &mut dyn OutputSink,
    ) -> Result<BatchReport, ClientError> {
        let provider = self.providers.create(provider_name)?;
        info!(
            provider = provider_name,
            inputs = inputs.len(),
            stream,
            "Simulating context"
        );

        let mut report = BatchReport::default();
        for (offset, input) in inputs.iter().enumerate() {
            let index = offset + 1;
            report.attempted += 1;
            sink.begin_item(index, input);

            match dispatch(provider.as_ref(), context, input, stream, sink).await {
                Ok(output) => {
                    if !stream {
                        sink.item_output(index, &output);
                        report.items.push(BatchItem {
                            input: input.clone(),
                            output,
                        });
                    }
                }
                Err(error) => {
                    warn!(index, error = %error, "Input failed, continuing");
                    sink.item_failed(index, &error);
                    report.failures.push(ItemFailure {
                        index,
                        input: input.clone(),
                        error,
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Read batch inputs: a JSON array of strings for `.json` files, otherwise one
/// input per non-blank line.
pub fn load_inputs(path: &Path) -> Result<Vec<String>, ClientError> {
    if !path.exists() {
        return Err(ClientError::InvalidContext(format!(
            "Inputs file {} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        return serde_json::from_str(&content).map_err(|e| {
            ClientError::Serialization(format!(
                "Inputs file {} must be a JSON array of strings: {}",
                path.display(),
                e
            ))
        });
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
