//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, uses_registry};
pub use output::map_error;
pub use parse::{
    Cli, Commands, CreateCommands, DeleteCommands, ExportCommands, GetCommands, ListCommands,
    RunCommands, SimulateCommands,
};
pub use presentation::{
    format_banner, format_batch_result, format_context_json, format_context_list,
    format_created, format_deleted, format_export_report, format_exported,
    format_model_response, TerminalSink,
};
pub use route::RunContext;
