//! Aggregator rewrite of the input file
//!
//! After splitting, the input keeps its boilerplate prefix and gains one
//! reference line per destination. Everything else in it is discarded, so
//! before rewriting we check that nothing but extracted functions, whitespace
//! and comments would be lost.

use std::path::{Component, Path};

use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::extract::{FunctionRecord, LineIndex, first_code_offset};
use crate::string_utils::snippet;

const SNIPPET_CHARS: usize = 80;

/// The rewritten input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorFile {
    pub banner: Vec<String>,
    /// Input text preceding the first extracted function, verbatim.
    pub prefix: String,
    pub references: Vec<String>,
}

impl AggregatorFile {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.banner {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.prefix);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for reference in &self.references {
            out.push_str(reference);
            out.push('\n');
        }
        out
    }
}

/// Reference path for a destination: the output directory as configured
/// joined with the destination's relative path, always `/`-separated.
pub fn reference_path(output_directory: &Path, relative: &Path) -> String {
    output_directory
        .components()
        .chain(relative.components())
        .filter_map(|component| match component {
            Component::CurDir => None,
            Component::RootDir => Some(String::new()),
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn render_reference(template: &str, path: &str) -> String {
    template.replace("{path}", path)
}

/// What lies between and after extracted functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interstitial {
    /// One `OrphanedCode` diagnostic per gap that holds code.
    pub orphans: Vec<Diagnostic>,
    /// Comment-only gaps not carried into a fragment; dropped by the rewrite.
    pub comment_blocks: usize,
}

/// Inspect the text the aggregator rewrite would discard.
///
/// `records` must be in input order.
pub fn scan_interstitial(text: &str, records: &[FunctionRecord]) -> Interstitial {
    let lines = LineIndex::new(text);
    let mut result = Interstitial::default();

    let gaps = records.iter().enumerate().map(|(i, record)| {
        let next = records.get(i + 1);
        let end = next.map_or(text.len(), |next| next.source_span.start);
        let attached = next.is_some_and(|next| !next.leading_comment.is_empty());
        (record.source_span.end..end, attached)
    });

    for (gap, attached) in gaps {
        let segment = &text[gap.clone()];
        match first_code_offset(segment) {
            Some(offset) => {
                let line = lines.line_of(gap.start + offset);
                let line_text = &text[lines.line_range(line, text)];
                tracing::warn!("line {}: code outside any extracted function", line);
                result.orphans.push(Diagnostic::OrphanedCode {
                    line,
                    text: snippet(line_text, SNIPPET_CHARS),
                });
            }
            None if attached => {}
            None if !segment.trim().is_empty() => {
                tracing::debug!("dropping comment block after offset {}", gap.start);
                result.comment_blocks += 1;
            }
            None => {}
        }
    }

    result
}

/// Why the aggregator rewrite was withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum WithholdReason {
    #[error("{count} function body(s) never closed")]
    UnterminatedBodies { count: usize },
    #[error("{count} duplicate definition(s) dropped")]
    DuplicateDefinitions { count: usize },
    #[error("{count} destination file(s) failed to write")]
    WriteFailures { count: usize },
    #[error("{count} destination file(s) do not balance their braces")]
    UnbalancedDestinations { count: usize },
    #[error("code outside extracted functions in {count} place(s)")]
    OrphanedCode { count: usize },
    #[error("input is not valid UTF-8 and would be rewritten with replacement characters")]
    LossyInput,
}

/// Counts the gate looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateInputs {
    pub unterminated: usize,
    pub duplicates: usize,
    pub write_failures: usize,
    pub unbalanced: usize,
    pub orphaned: usize,
    pub lossy: bool,
}

/// Reasons to keep the input untouched; empty means the rewrite is safe.
pub fn withhold_reasons(inputs: GateInputs) -> Vec<WithholdReason> {
    [
        (inputs.unterminated, WithholdReason::UnterminatedBodies { count: inputs.unterminated }),
        (inputs.duplicates, WithholdReason::DuplicateDefinitions { count: inputs.duplicates }),
        (inputs.write_failures, WithholdReason::WriteFailures { count: inputs.write_failures }),
        (inputs.unbalanced, WithholdReason::UnbalancedDestinations { count: inputs.unbalanced }),
        (inputs.orphaned, WithholdReason::OrphanedCode { count: inputs.orphaned }),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(_, reason)| reason)
    .chain(inputs.lossy.then_some(WithholdReason::LossyInput))
    .collect()
}
