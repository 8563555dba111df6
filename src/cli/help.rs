//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{
    Commands, CreateCommands, DeleteCommands, ExportCommands, GetCommands, ListCommands,
    RunCommands, SimulateCommands,
};

/// Command name string for log spans (e.g. "create.context", "export.all").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Create { command } => format!("create.{}", create_command_name(command)),
        Commands::Get { command } => format!("get.{}", get_command_name(command)),
        Commands::List { command } => format!("list.{}", list_command_name(command)),
        Commands::Delete { command } => format!("delete.{}", delete_command_name(command)),
        Commands::Export { command } => format!("export.{}", export_command_name(command)),
        Commands::Run { command } => format!("run.{}", run_command_name(command)),
        Commands::Simulate { command } => format!("simulate.{}", simulate_command_name(command)),
    }
}

pub fn create_command_name(command: &CreateCommands) -> &'static str {
    match command {
        CreateCommands::Context { .. } => "context",
    }
}

pub fn get_command_name(command: &GetCommands) -> &'static str {
    match command {
        GetCommands::Context { .. } => "context",
    }
}

pub fn list_command_name(command: &ListCommands) -> &'static str {
    match command {
        ListCommands::Contexts { .. } => "contexts",
    }
}

pub fn delete_command_name(command: &DeleteCommands) -> &'static str {
    match command {
        DeleteCommands::Context { .. } => "context",
    }
}

pub fn export_command_name(command: &ExportCommands) -> &'static str {
    match command {
        ExportCommands::Context { .. } => "context",
        ExportCommands::All { .. } => "all",
    }
}

pub fn run_command_name(command: &RunCommands) -> &'static str {
    match command {
        RunCommands::Context { .. } => "context",
    }
}

pub fn simulate_command_name(command: &SimulateCommands) -> &'static str {
    match command {
        SimulateCommands::Context { .. } => "context",
    }
}

/// Whether the command talks to the context registry (as opposed to a provider).
pub fn uses_registry(command: &Commands) -> bool {
    !matches!(command, Commands::Run { .. } | Commands::Simulate { .. })
}
