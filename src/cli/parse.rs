//! CLI parse: clap types for mcp-client. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mcp-client - Model Context Protocol CLI for CockroachDB
#[derive(Parser, Debug)]
#[command(name = "mcp-client", version)]
#[command(about = "Manage and run model contexts stored in a CockroachDB-backed MCP registry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// MCP server URL (overrides MCP_SERVER_URL and the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Bearer token for the MCP server (overrides MCP_API_TOKEN and the config file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Configuration file path (default: ~/.config/cockroachdb-mcp-client/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress the banner and all logging below error
    #[arg(long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create resources in the registry
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Fetch a resource by id
    Get {
        #[command(subcommand)]
        command: GetCommands,
    },
    /// List resources
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Delete a resource by id
    Delete {
        #[command(subcommand)]
        command: DeleteCommands,
    },
    /// Export resources to files
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Run a context file against an LLM provider
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Run a context file against a batch of inputs
    Simulate {
        #[command(subcommand)]
        command: SimulateCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create a context from a YAML or JSON file
    Context {
        /// Context file (.yaml, .yml, or .json)
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum GetCommands {
    /// Show one context as JSON
    Context {
        /// Context id
        context_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// List all contexts
    Contexts {
        /// Output format (json, yaml, or table)
        #[arg(long, default_value = "json")]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeleteCommands {
    /// Delete one context
    Context {
        /// Context id
        context_id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export one context without server-assigned fields
    Context {
        /// Context id
        context_id: String,
        /// Destination file
        #[arg(long, short)]
        file: PathBuf,
        /// Output format (yaml or json)
        #[arg(long, default_value = "yaml")]
        output: String,
    },
    /// Export every context into a directory
    All {
        /// Destination directory (created if missing)
        #[arg(long, short = 'd')]
        output_dir: PathBuf,
        /// Output format (yaml or json)
        #[arg(long, default_value = "yaml")]
        output: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Send one input through a context
    Context {
        /// Provider name (openai, anthropic)
        #[arg(long, short)]
        provider: String,
        /// Context file (.yaml, .yml, or .json)
        #[arg(long, short)]
        file: PathBuf,
        /// User input
        #[arg(long, short)]
        input: String,
        /// Stream the response as it is generated
        #[arg(long, short)]
        stream: bool,
        /// Override body.model from the context file
        #[arg(long, short)]
        model: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SimulateCommands {
    /// Send each input from a file through a context
    Context {
        /// Provider name (openai, anthropic)
        #[arg(long, short)]
        provider: String,
        /// Context file (.yaml, .yml, or .json)
        #[arg(long, short)]
        file: PathBuf,
        /// Inputs file: one input per line, or a JSON array of strings
        #[arg(long, short)]
        inputs: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        output: String,
        /// Stream each response as it is generated
        #[arg(long, short)]
        stream: bool,
    },
}
