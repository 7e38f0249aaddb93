//! JSON output formatting

use std::io;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Severity};
use crate::pipeline::RunSummary;

/// A diagnostic with its severity and rendered message alongside the
/// structured fields.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic<'a> {
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub diagnostic: &'a Diagnostic,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary<'a> {
    #[serde(flatten)]
    pub summary: &'a RunSummary,
    pub success: bool,
    pub diagnostics: Vec<JsonDiagnostic<'a>>,
}

impl<'a> JsonSummary<'a> {
    pub fn new(summary: &'a RunSummary, strict: bool) -> Self {
        Self {
            summary,
            success: summary.succeeded(strict),
            diagnostics: summary
                .diagnostics
                .iter()
                .map(|diagnostic| JsonDiagnostic {
                    severity: diagnostic.severity(),
                    message: diagnostic.to_string(),
                    diagnostic,
                })
                .collect(),
        }
    }
}

/// Print the run summary as pretty-printed JSON to stdout.
pub fn print_summary_json(summary: &RunSummary, strict: bool) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&JsonSummary::new(summary, strict))
        .map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
