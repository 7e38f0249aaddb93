//! End-to-end splitting run
//!
//! `run` reads the input, extracts and classifies every definition, writes
//! the destination files and finally rewrites the input as an aggregator.
//! Per-function and per-file problems are collected as diagnostics in the
//! returned `RunSummary`; only setup failures are returned as errors.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::assemble::{
    self, AggregatorFile, FileNamer, GateInputs, PreambleBuilder, WithholdReason,
};
use crate::classify::{Classification, ClassificationReason, Classifier, classify_all};
use crate::config::SplitConfig;
use crate::diagnostics::{Diagnostic, Severity, SplitError};
use crate::extract::{self, DeclarationExtractor, Extractor, FunctionExtractor};
use crate::file_utils::{WriteStatus, infer_declarations_path, read_source_text, write_atomically};

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Declarations file; inferred from the input when absent.
    pub declarations: Option<PathBuf>,
    pub config: SplitConfig,
    /// Report what would be written without touching the filesystem.
    pub dry_run: bool,
    /// Rewrite the aggregator even when the safety gate objects.
    pub force: bool,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, config: SplitConfig) -> Self {
        Self {
            input: input.into(),
            declarations: None,
            config,
            dry_run: false,
            force: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    Written,
    Unchanged,
    /// Dry run: would be written.
    Planned,
    Failed,
}

impl From<WriteStatus> for DestinationStatus {
    fn from(status: WriteStatus) -> Self {
        match status {
            WriteStatus::Written => DestinationStatus::Written,
            WriteStatus::Unchanged => DestinationStatus::Unchanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationReport {
    pub path: PathBuf,
    /// Line referencing this file from the aggregator.
    pub reference: String,
    pub classification: Classification,
    pub functions: Vec<String>,
    pub status: DestinationStatus,
}

/// What happened to the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregatorOutcome {
    Rewritten,
    Unchanged,
    /// Dry run: would be rewritten.
    Planned,
    Withheld { reasons: Vec<WithholdReason> },
    Failed { message: String },
    /// No definitions found; the input was left alone.
    NothingToSplit,
}

/// Run-local counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub candidates: usize,
    pub extracted: usize,
    pub nested: usize,
    pub unterminated: usize,
    pub unrecognized: usize,
    pub defaulted: usize,
    pub duplicates: usize,
    pub comment_blocks_dropped: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub owner: String,
    pub declarations: Option<PathBuf>,
    pub output_root: PathBuf,
    pub dry_run: bool,
    pub forced: bool,
    pub counts: RunCounts,
    pub destinations: Vec<DestinationReport>,
    pub aggregator: AggregatorOutcome,
    /// Serialized with severities by the JSON reporter.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn count_at(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    /// True when every candidate was extracted and written and the aggregator
    /// was handled. `strict` also fails on warnings.
    pub fn succeeded(&self, strict: bool) -> bool {
        let aggregator_ok = !matches!(
            self.aggregator,
            AggregatorOutcome::Withheld { .. } | AggregatorOutcome::Failed { .. }
        );
        let errors = self.count_at(Severity::Error);
        let warnings = self.count_at(Severity::Warning);
        aggregator_ok && errors == 0 && (!strict || warnings == 0)
    }

    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.succeeded(strict) { 0 } else { 1 }
    }
}

/// Directory destination paths are resolved against: relative output
/// directories hang off the input's directory.
pub fn output_root(input: &Path, output_directory: &Path) -> PathBuf {
    if output_directory.is_absolute() {
        return output_directory.to_path_buf();
    }
    input
        .parent()
        .map(|dir| dir.join(output_directory))
        .unwrap_or_else(|| output_directory.to_path_buf())
}

pub fn run(options: &RunOptions) -> Result<RunSummary, SplitError> {
    let config = &options.config;
    config.validate()?;

    let input = &options.input;
    let source = read_source_text(input)?;
    let owner = config.resolve_owner(input)?;
    tracing::info!("splitting `{}` members out of {}", owner, input.display());

    let mut diagnostics = Vec::new();
    if source.lossy {
        tracing::warn!("{} is not valid UTF-8, decoded lossily", input.display());
        diagnostics.push(Diagnostic::LossyDecode {
            path: input.clone(),
        });
    }

    let extractor = FunctionExtractor::from_config(&owner, config)?;
    let extraction = extractor.extract(&source.text);
    tracing::debug!(
        "{} extractor: {} candidate(s), {} extracted",
        extractor.name(),
        extraction.candidates,
        extraction.records.len()
    );
    diagnostics.extend(extraction.diagnostics.iter().cloned());

    let declarations = options
        .declarations
        .clone()
        .or_else(|| infer_declarations_path(input));
    if let Some(path) = &declarations {
        diagnostics.extend(check_declarations(path, &owner, &extraction.records)?);
    }

    let mut summary = RunSummary {
        input: input.clone(),
        owner: owner.clone(),
        declarations: declarations.clone(),
        output_root: output_root(input, &config.output_directory),
        dry_run: options.dry_run,
        forced: options.force,
        counts: RunCounts {
            candidates: extraction.candidates,
            extracted: extraction.records.len(),
            nested: extraction.nested,
            unterminated: extraction.unterminated,
            unrecognized: extraction.unrecognized,
            ..Default::default()
        },
        destinations: Vec::new(),
        aggregator: AggregatorOutcome::NothingToSplit,
        diagnostics,
    };

    if extraction.records.is_empty() {
        tracing::info!("no `{}::` definitions found, nothing to split", owner);
        return Ok(summary);
    }

    let (classified, class_diagnostics) =
        classify_all(&Classifier::from_config(config), &extraction.records);
    summary.counts.defaulted = classified
        .iter()
        .filter(|c| c.reason == ClassificationReason::Default)
        .count();
    summary.diagnostics.extend(class_diagnostics);

    let prefix = &source.text[..extraction.prefix_end(source.text.len())];
    let declarations_file = declarations
        .as_deref()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str());
    let preambles = PreambleBuilder::new(config, declarations_file, prefix);
    let namer = FileNamer::new(
        &config.naming,
        &owner,
        &config.dispatch_method,
        input.extension().and_then(|e| e.to_str()),
    );

    let grouping = assemble::group(&extraction.records, &classified, &namer, &preambles);
    summary.counts.duplicates = grouping.duplicates;
    summary.diagnostics.extend(grouping.diagnostics.iter().cloned());

    let mut gate = GateInputs {
        unterminated: extraction.unterminated,
        duplicates: grouping.duplicates,
        lossy: source.lossy,
        ..Default::default()
    };

    let mut references = Vec::with_capacity(grouping.destinations.len());
    for destination in &grouping.destinations {
        let full_path = summary.output_root.join(&destination.path);
        let content = destination.render();

        let balance = assemble::verify_balance(&content, config.scan_mode);
        if !balance.is_balanced() {
            tracing::error!("{} does not balance (net {})", full_path.display(), balance.net);
            gate.unbalanced += 1;
            summary.diagnostics.push(Diagnostic::UnbalancedDestination {
                path: full_path.clone(),
                depth: balance.net,
            });
        }

        let status = if options.dry_run {
            DestinationStatus::Planned
        } else {
            match write_atomically(&full_path, &content) {
                Ok(status) => {
                    tracing::info!("{:?}: {}", status, full_path.display());
                    status.into()
                }
                Err(err) => {
                    tracing::error!("failed to write {}: {}", full_path.display(), err);
                    gate.write_failures += 1;
                    summary.diagnostics.push(Diagnostic::OutputWriteFailure {
                        path: full_path.clone(),
                        message: err.to_string(),
                    });
                    DestinationStatus::Failed
                }
            }
        };

        let reference = assemble::render_reference(
            &config.reference_template,
            &assemble::reference_path(&config.output_directory, &destination.path),
        );
        references.push(reference.clone());
        summary.destinations.push(DestinationReport {
            path: full_path,
            reference,
            classification: destination.classification.clone(),
            functions: destination.function_names(),
            status,
        });
    }

    let interstitial = assemble::scan_interstitial(&source.text, &extraction.records);
    gate.orphaned = interstitial.orphans.len();
    summary.counts.comment_blocks_dropped = interstitial.comment_blocks;
    summary.diagnostics.extend(interstitial.orphans);

    let aggregator = AggregatorFile {
        banner: config.aggregator_banner.clone(),
        prefix: prefix.to_string(),
        references,
    };
    summary.aggregator = rewrite_aggregator(input, &aggregator, gate, options, &mut summary.diagnostics);

    Ok(summary)
}

fn rewrite_aggregator(
    input: &Path,
    aggregator: &AggregatorFile,
    gate: GateInputs,
    options: &RunOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> AggregatorOutcome {
    let reasons = assemble::withhold_reasons(gate);
    if !reasons.is_empty() {
        if options.force {
            for reason in &reasons {
                tracing::warn!("rewriting {} despite: {}", input.display(), reason);
            }
        } else {
            for reason in &reasons {
                tracing::warn!("leaving {} untouched: {}", input.display(), reason);
            }
            return AggregatorOutcome::Withheld { reasons };
        }
    }

    if options.dry_run {
        return AggregatorOutcome::Planned;
    }

    match write_atomically(input, &aggregator.render()) {
        Ok(WriteStatus::Written) => {
            tracing::info!("rewrote {} as aggregator", input.display());
            AggregatorOutcome::Rewritten
        }
        Ok(WriteStatus::Unchanged) => AggregatorOutcome::Unchanged,
        Err(err) => {
            tracing::error!("failed to rewrite {}: {}", input.display(), err);
            diagnostics.push(Diagnostic::OutputWriteFailure {
                path: input.to_path_buf(),
                message: err.to_string(),
            });
            AggregatorOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}

/// Cross-reference extracted names against the declarations file.
fn check_declarations(
    path: &Path,
    owner: &str,
    records: &[extract::FunctionRecord],
) -> Result<Vec<Diagnostic>, SplitError> {
    let header = read_source_text(path)?;
    let mut diagnostics = Vec::new();
    if header.lossy {
        diagnostics.push(Diagnostic::LossyDecode {
            path: path.to_path_buf(),
        });
    }

    match DeclarationExtractor::new(owner).extract(&header.text) {
        Some(declared) => {
            tracing::debug!(
                "{} declares {} member(s) of `{}`",
                path.display(),
                declared.names.len(),
                owner
            );
            diagnostics.extend(extract::cross_reference(records, &declared));
        }
        None => tracing::warn!("no body for `{}` found in {}", owner, path.display()),
    }
    Ok(diagnostics)
}
