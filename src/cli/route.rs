//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{
    Commands, CreateCommands, DeleteCommands, ExportCommands, GetCommands, ListCommands,
    RunCommands, SimulateCommands,
};
use crate::cli::presentation::{
    format_batch_result, format_context_json, format_context_list, format_created,
    format_deleted, format_export_report, format_exported, format_model_response, TerminalSink,
};
use crate::cli::{command_name, uses_registry};
use crate::config::{ConfigResolver, ConnectionConfig};
use crate::context::{Context, DocumentFormat};
use crate::error::ClientError;
use crate::invocation::{load_inputs, Orchestrator, OutputSink};
use crate::provider::ProviderRegistry;
use crate::registry::RegistryClient;
use crate::retry::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: resolved settings, tokio runtime, and domain services.
pub struct RunContext {
    resolver: ConfigResolver,
    server_override: Option<String>,
    token_override: Option<String>,
    retry: RetryPolicy,
    orchestrator: Orchestrator,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from an optional config path and connection overrides.
    pub fn new(
        config_path: Option<PathBuf>,
        server: Option<String>,
        token: Option<String>,
    ) -> Result<Self, ClientError> {
        let resolver = match config_path {
            Some(path) => ConfigResolver::with_config_path(path),
            None => ConfigResolver::new(),
        };
        Self::with_resolver(resolver, server, token)
    }

    pub fn with_resolver(
        resolver: ConfigResolver,
        server: Option<String>,
        token: Option<String>,
    ) -> Result<Self, ClientError> {
        let runtime = Runtime::new()
            .map_err(|e| ClientError::Config(format!("Failed to create async runtime: {}", e)))?;
        let orchestrator = Orchestrator::new(ProviderRegistry::builtin(resolver.clone()));
        Ok(Self {
            resolver,
            server_override: server,
            token_override: token,
            retry: RetryPolicy::default(),
            orchestrator,
            runtime,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the provider table (e.g. to add providers beyond the built-ins).
    pub fn with_providers(mut self, providers: ProviderRegistry) -> Self {
        self.orchestrator = Orchestrator::new(providers);
        self
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Connection settings, re-resolved on every call.
    pub fn connection(&self) -> ConnectionConfig {
        self.resolver.resolve_connection(
            self.server_override.as_deref(),
            self.token_override.as_deref(),
        )
    }

    fn registry(&self) -> Result<RegistryClient, ClientError> {
        Ok(RegistryClient::new(self.connection())?.with_retry_policy(self.retry))
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ClientError> {
        let started = Instant::now();
        let name = command_name(command);
        if uses_registry(command) {
            debug!(command = %name, server = %self.connection().server, "Executing command");
        } else {
            debug!(command = %name, "Executing command");
        }
        let result = self.execute_inner(command);
        info!(
            command = %name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ClientError> {
        match command {
            Commands::Create {
                command: CreateCommands::Context { file },
            } => self.handle_create_context(file),
            Commands::Get {
                command: GetCommands::Context { context_id },
            } => self.handle_get_context(context_id),
            Commands::List {
                command: ListCommands::Contexts { output },
            } => self.handle_list_contexts(output),
            Commands::Delete {
                command: DeleteCommands::Context { context_id, yes },
            } => self.handle_delete_context(context_id, *yes),
            Commands::Export { command } => self.handle_export(command),
            Commands::Run {
                command:
                    RunCommands::Context {
                        provider,
                        file,
                        input,
                        stream,
                        model,
                    },
            } => self.handle_run_context(provider, file, input, *stream, model.as_deref()),
            Commands::Simulate {
                command:
                    SimulateCommands::Context {
                        provider,
                        file,
                        inputs,
                        output,
                        stream,
                    },
            } => self.handle_simulate_context(provider, file, inputs, output, *stream),
        }
    }

    fn handle_create_context(&self, file: &Path) -> Result<String, ClientError> {
        let context = Context::load(file)?;
        let registry = self.registry()?;
        let name = self.runtime.block_on(registry.create(&context))?;
        Ok(format_created(&name))
    }

    fn handle_get_context(&self, context_id: &str) -> Result<String, ClientError> {
        let registry = self.registry()?;
        let context = self.runtime.block_on(registry.get(context_id))?;
        format_context_json(&context)
    }

    fn handle_list_contexts(&self, output: &str) -> Result<String, ClientError> {
        let registry = self.registry()?;
        let list = self.runtime.block_on(registry.list())?;
        format_context_list(&list, output)
    }

    fn handle_delete_context(&self, context_id: &str, yes: bool) -> Result<String, ClientError> {
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete context '{}'?", context_id))
                .default(false)
                .interact()
                .map_err(|e| ClientError::Config(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Cancelled.".to_string());
            }
        }

        let registry = self.registry()?;
        self.runtime.block_on(registry.delete(context_id))?;
        Ok(format_deleted(context_id))
    }

    fn handle_export(&self, command: &ExportCommands) -> Result<String, ClientError> {
        match command {
            ExportCommands::Context {
                context_id,
                file,
                output,
            } => {
                let format = DocumentFormat::parse(output)?;
                let registry = self.registry()?;
                let path = self
                    .runtime
                    .block_on(registry.export_to_file(context_id, file, format))?;
                Ok(format_exported(&path))
            }
            ExportCommands::All { output_dir, output } => {
                let format = DocumentFormat::parse(output)?;
                let registry = self.registry()?;
                let report = self
                    .runtime
                    .block_on(registry.export_all(output_dir, format))?;
                Ok(format_export_report(&report, output_dir))
            }
        }
    }

    fn handle_run_context(
        &self,
        provider: &str,
        file: &Path,
        input: &str,
        stream: bool,
        model: Option<&str>,
    ) -> Result<String, ClientError> {
        let mut sink = TerminalSink::stdout();
        self.run_context_with_sink(provider, file, input, stream, model, &mut sink)
    }

    /// `run context` with an explicit sink. Streamed output goes to the sink and
    /// the returned string is empty.
    pub fn run_context_with_sink(
        &self,
        provider: &str,
        file: &Path,
        input: &str,
        stream: bool,
        model: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<String, ClientError> {
        self.orchestrator.providers().validate(provider)?;
        let context = Context::load(file)?;
        let response = self.runtime.block_on(
            self.orchestrator
                .run_once(provider, context, input, stream, model, sink),
        )?;
        if stream {
            Ok(String::new())
        } else {
            Ok(format_model_response(&response))
        }
    }

    fn handle_simulate_context(
        &self,
        provider: &str,
        file: &Path,
        inputs: &Path,
        output: &str,
        stream: bool,
    ) -> Result<String, ClientError> {
        let mut sink = TerminalSink::stdout();
        self.simulate_context_with_sink(provider, file, inputs, output, stream, &mut sink)
    }

    /// `simulate context` with an explicit sink.
    pub fn simulate_context_with_sink(
        &self,
        provider: &str,
        file: &Path,
        inputs: &Path,
        output: &str,
        stream: bool,
        sink: &mut dyn OutputSink,
    ) -> Result<String, ClientError> {
        self.orchestrator.providers().validate(provider)?;
        if output != "text" && output != "json" {
            return Err(ClientError::Config(format!(
                "Unsupported output format: {} (must be 'text' or 'json')",
                output
            )));
        }
        let context = Context::load(file)?;
        let inputs = load_inputs(inputs)?;
        let report = self.runtime.block_on(
            self.orchestrator
                .run_batch(provider, &context, &inputs, stream, sink),
        )?;
        format_batch_result(&report, output, stream)
    }
}
