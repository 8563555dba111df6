//! mcp-client Binary
//!
//! Command-line interface for the context registry and LLM provider invocation.

use clap::Parser;
use mcp_client::cli::{format_banner, map_error, Cli, RunContext};
use mcp_client::config::ConfigResolver;
use mcp_client::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let resolver = match cli.config {
        Some(ref path) => ConfigResolver::with_config_path(path.clone()),
        None => ConfigResolver::new(),
    };
    let logging_config = build_logging_config(&cli, &resolver);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if !cli.quiet {
        eprintln!("{}\n", format_banner(env!("CARGO_PKG_VERSION")));
    }

    info!("mcp-client starting");

    let context = match RunContext::new(cli.config.clone(), cli.server.clone(), cli.token.clone())
    {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing client: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(e.exit_code());
        }
    };

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(e.exit_code());
        }
    }
}

/// Build logging configuration from CLI args, environment and config file.
/// Precedence: CLI flags override environment override config file override defaults.
fn build_logging_config(cli: &Cli, resolver: &ConfigResolver) -> LoggingConfig {
    let mut config = resolver.load_file().logging().unwrap_or_default();
    config.apply_env(|key| resolver.env_var(key));

    if cli.quiet {
        config.level = "error".to_string();
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
