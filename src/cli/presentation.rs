//! CLI presentation: text, json, and yaml formatters per command family.

mod context;
mod invocation;
mod shared;

pub use context::{
    format_context_json, format_context_list, format_created, format_deleted,
    format_export_report, format_exported,
};
pub use invocation::{format_batch_result, format_model_response, TerminalSink};
pub use shared::format_banner;
