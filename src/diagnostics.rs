//! Error and diagnostic types
//!
//! `SplitError` covers the failures that stop a run before any splitting
//! happens (unreadable input or configuration). Everything that can go wrong
//! with an individual function or output file is a `Diagnostic`: it is
//! recorded in the run summary and the batch keeps going.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal setup errors.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("cannot read {}: {source}", path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("cannot read config {}: {source}", path.display())]
    ReadConfig { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot build signature pattern for owner `{owner}`: {source}")]
    Pattern { owner: String, source: regex::Error },
}

/// How much a diagnostic matters for the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A recoverable problem found during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Brace depth never returned to zero; the function was dropped.
    #[error("line {line}: body of `{name}` is never closed, function skipped")]
    UnterminatedBody { name: String, line: usize },

    /// A top-level line mentions the owning type but is not a definition the
    /// matcher understands.
    #[error("line {line}: `{text}` mentions the owning type but was not recognized")]
    UnrecognizedSignatureShape { line: usize, text: String },

    /// Routed to the helper file because no rule claimed it.
    #[error("line {line}: `{name}` routed to helpers by default ({reason})")]
    MisclassifiedDefault {
        name: String,
        line: usize,
        reason: String,
    },

    #[error("failed to write {}: {message}", path.display())]
    OutputWriteFailure { path: PathBuf, message: String },

    /// Same signature defined twice in one destination; the later one was dropped.
    #[error(
        "line {line}: `{name}` duplicates the definition at line {first_line} in {}",
        destination.display()
    )]
    DuplicateDefinition {
        name: String,
        line: usize,
        first_line: usize,
        destination: PathBuf,
    },

    #[error("{} does not balance its braces (net depth {depth})", path.display())]
    UnbalancedDestination { path: PathBuf, depth: i64 },

    /// Code between extracted functions that the aggregator rewrite would discard.
    #[error("line {line}: code outside any extracted function: `{text}`")]
    OrphanedCode { line: usize, text: String },

    #[error("line {line}: `{name}` is defined but not declared in the declarations file")]
    UndeclaredFunction { name: String, line: usize },

    #[error("`{name}` is declared but no definition was extracted")]
    MissingDefinition { name: String },

    #[error("{} is not valid UTF-8; invalid sequences were replaced", path.display())]
    LossyDecode { path: PathBuf },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UnterminatedBody { .. }
            | Diagnostic::OutputWriteFailure { .. }
            | Diagnostic::DuplicateDefinition { .. }
            | Diagnostic::UnbalancedDestination { .. } => Severity::Error,
            Diagnostic::UnrecognizedSignatureShape { .. }
            | Diagnostic::MisclassifiedDefault { .. }
            | Diagnostic::OrphanedCode { .. }
            | Diagnostic::LossyDecode { .. } => Severity::Warning,
            Diagnostic::UndeclaredFunction { .. } | Diagnostic::MissingDefinition { .. } => {
                Severity::Info
            }
        }
    }
}
