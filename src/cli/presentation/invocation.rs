//! Invocation presentation: terminal sink and run/simulate result formatters.

use crate::error::ClientError;
use crate::invocation::{BatchReport, OutputSink};
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Write};

/// Writes invocation output to stdout as it arrives.
pub struct TerminalSink<W: Write = std::io::Stdout> {
    out: W,
    color: bool,
}

impl TerminalSink {
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let color = out.is_terminal();
        Self { out, color }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, text: &str, paint: fn(&str) -> String) -> String {
        if self.color {
            paint(text)
        } else {
            text.to_string()
        }
    }

    // Terminal writes are best-effort; a closed stdout must not abort a batch.
    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write> OutputSink for TerminalSink<W> {
    fn fragment(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    fn end_stream(&mut self) {
        self.write_line("");
    }

    fn begin_item(&mut self, index: usize, input: &str) {
        let label = self.label(&format!("Input {}:", index), |s| s.cyan().bold().to_string());
        self.write_line(&format!("\n{} {}", label, input));
    }

    fn item_output(&mut self, _index: usize, output: &str) {
        let label = self.label("Output:", |s| s.green().bold().to_string());
        self.write_line(&format!("{} {}", label, output));
    }

    fn item_failed(&mut self, index: usize, error: &ClientError) {
        let label = self.label(&format!("Failed on input {}:", index), |s| {
            s.red().bold().to_string()
        });
        self.write_line(&format!("{} {}", label, error));
    }
}

pub fn format_model_response(response: &str) -> String {
    format!("Model Response:\n{}", response)
}

/// Final output of `simulate`: the JSON list of results, or a summary line.
pub fn format_batch_result(
    report: &BatchReport,
    output: &str,
    stream: bool,
) -> Result<String, ClientError> {
    match output {
        "json" if !stream => Ok(serde_json::to_string_pretty(&report.items)?),
        "json" | "text" => Ok(format!(
            "\nProcessed {} input(s): {} succeeded, {} failed",
            report.attempted,
            report.succeeded(),
            report.failures.len()
        )),
        other => Err(ClientError::Config(format!(
            "Unsupported output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}
