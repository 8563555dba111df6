//! Shared presentation: startup banner.

use owo_colors::OwoColorize;

/// Startup banner, printed to stderr unless `--quiet`.
pub fn format_banner(version: &str) -> String {
    format!(
        "{} {}\n{}",
        "mcp-client".bold().cyan(),
        format!("v{}", version).dimmed(),
        "Model Context Protocol client for CockroachDB".dimmed()
    )
}
