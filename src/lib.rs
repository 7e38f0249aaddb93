//! Cleave - split monolithic member-function files into generated fragments

pub mod assemble;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod extract;
pub mod file_utils;
pub mod output;
pub mod pipeline;
pub mod string_utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::{Classification, ClassificationReason, Classifier};
pub use config::{ScanMode, SplitConfig, locate_config};
pub use diagnostics::{Diagnostic, Severity, SplitError};
pub use extract::{Extractor, FunctionExtractor, FunctionRecord};
pub use output::{print_summary, print_summary_json};
pub use pipeline::{AggregatorOutcome, RunOptions, RunSummary, run};
