//! Context presentation: registry results as json, yaml, or table text.

use crate::context::Context;
use crate::error::ClientError;
use crate::registry::{ContextList, ExportReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use std::path::Path;

pub fn format_created(context_name: &str) -> String {
    format!("Context created: {}", context_name)
}

pub fn format_deleted(context_id: &str) -> String {
    format!("Deleted: {}", context_id)
}

pub fn format_context_json(context: &Context) -> Result<String, ClientError> {
    Ok(serde_json::to_string_pretty(context)?)
}

/// Render a list result. The empty list still prints as data in json and yaml
/// so scripts can tell it apart from a failure.
pub fn format_context_list(list: &ContextList, format: &str) -> Result<String, ClientError> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(list)?),
        "yaml" | "yml" => Ok(serde_yaml::to_string(list)?.trim_end().to_string()),
        "table" => {
            if list.is_empty() {
                return Ok("No contexts found.".to_string());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["ID", "Name"]);
            for reference in &list.contexts {
                table.add_row(vec![reference.id.clone(), reference.context_name.clone()]);
            }
            Ok(table.to_string())
        }
        other => Err(ClientError::Config(format!(
            "Unsupported output format: {} (must be 'json', 'yaml', or 'table')",
            other
        ))),
    }
}

pub fn format_exported(path: &Path) -> String {
    format!("Exported context to: {}", path.display())
}

pub fn format_export_report(report: &ExportReport, dir: &Path) -> String {
    if report.is_empty() {
        return "No contexts found to export.".to_string();
    }
    let mut lines: Vec<String> = report
        .written
        .iter()
        .map(|path| format!("  Exported: {}", path.display()))
        .collect();
    lines.insert(
        0,
        format!(
            "Exported {} context(s) to {}",
            report.written.len(),
            dir.display()
        ),
    );
    if !report.failures.is_empty() {
        lines.push(format!("\nFailed ({}):", report.failures.len()));
        for failure in &report.failures {
            lines.push(format!("  - {}: {}", failure.id, failure.error));
        }
    }
    lines.join("\n")
}
