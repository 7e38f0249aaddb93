//! Function extraction from a monolithic implementation file
//!
//! Two extractors share the `Extractor` interface:
//!
//! - **FunctionExtractor**: signature matching plus brace scanning, producing
//!   one `FunctionRecord` per well-formed definition of the owning type
//! - **DeclarationExtractor**: member names listed in the declarations file,
//!   used only for cross-reference diagnostics
//!
//! Extraction never fails as a whole. A definition whose body never closes is
//! dropped with an `UnterminatedBody` diagnostic and scanning continues with
//! the next candidate. A comment block that sits alone between two
//! definitions travels with the one after it.

pub mod declarations;
pub mod record;
pub mod scanner;
pub mod signature;

use std::ops::Range;

use crate::config::{ScanMode, SplitConfig};
use crate::diagnostics::{Diagnostic, SplitError};
use crate::string_utils::snippet;

pub use declarations::{DeclaredMembers, declared_members};
pub use record::FunctionRecord;
pub use scanner::{Balance, balance, find_matching_brace, first_code_offset};
pub use signature::{SignatureMatch, SignatureMatcher};

/// Longest source excerpt quoted in a diagnostic.
const SNIPPET_CHARS: usize = 80;

/// Common interface for pulling structured data out of source text.
pub trait Extractor {
    /// The output type produced by this extractor.
    type Output;

    fn extract(&self, text: &str) -> Self::Output;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Result of scanning an implementation file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Well-formed definitions in input order.
    pub records: Vec<FunctionRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Signatures the matcher found, including nested and unterminated ones.
    pub candidates: usize,
    /// Candidates skipped because they sat inside an accepted definition.
    pub nested: usize,
    pub unterminated: usize,
    pub unrecognized: usize,
}

impl Extraction {
    /// Offset where the first extracted definition begins, or the text length
    /// when nothing was extracted.
    pub fn prefix_end(&self, text_len: usize) -> usize {
        self.records
            .first()
            .map_or(text_len, |r| r.source_span.start)
    }
}

/// Line lookup for byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Byte range of the 1-based `line`, without its newline.
    pub fn line_range(&self, line: usize, text: &str) -> Range<usize> {
        let start = self.starts[line - 1];
        let end = self
            .starts
            .get(line)
            .map_or(text.len(), |next| next - 1);
        start..end
    }
}

/// Locates member-function definitions of one owning type.
#[derive(Debug, Clone)]
pub struct FunctionExtractor {
    matcher: SignatureMatcher,
    scan_mode: ScanMode,
}

impl FunctionExtractor {
    pub fn new(owner: &str, multiline: bool, scan_mode: ScanMode) -> Result<Self, SplitError> {
        Ok(Self {
            matcher: SignatureMatcher::new(owner, multiline)?,
            scan_mode,
        })
    }

    pub fn from_config(owner: &str, config: &SplitConfig) -> Result<Self, SplitError> {
        Self::new(owner, config.multiline_signatures, config.scan_mode)
    }

    pub fn owner(&self) -> &str {
        self.matcher.owner()
    }

    fn extract_functions(&self, text: &str) -> Extraction {
        let lines = LineIndex::new(text);
        let signatures = self.matcher.find_all(text);
        let mut extraction = Extraction {
            candidates: signatures.len(),
            ..Default::default()
        };

        // Text claimed by a signature or an accepted definition.
        let mut covered: Vec<Range<usize>> = Vec::new();
        let mut accepted_end = 0usize;

        for sig in &signatures {
            covered.push(sig.start..sig.open_brace + 1);
            let line = lines.line_of(sig.start);
            let qualified = format!("{}::{}", self.owner(), sig.name);

            if sig.start < accepted_end {
                tracing::debug!("line {}: `{}` is nested in a previous definition", line, qualified);
                extraction.nested += 1;
                continue;
            }

            let Some(close) = find_matching_brace(text, sig.open_brace, self.scan_mode) else {
                tracing::warn!("line {}: body of `{}` never closes", line, qualified);
                extraction.unterminated += 1;
                extraction.diagnostics.push(Diagnostic::UnterminatedBody {
                    name: qualified,
                    line,
                });
                continue;
            };

            let span = sig.start..close + 1;
            tracing::trace!("line {}: extracted `{}` ({} bytes)", line, qualified, span.len());
            covered.push(span.clone());

            let leading_comment = match extraction.records.last() {
                Some(previous) => self.comment_block(&text[previous.source_span.end..sig.start]),
                None => String::new(),
            };
            accepted_end = span.end;

            extraction.records.push(FunctionRecord {
                owner_type: self.owner().to_string(),
                name: sig.name.clone(),
                param_list: sig.params.clone(),
                is_const: sig.is_const,
                leading_comment,
                signature_prefix: text[sig.start..sig.open_brace].to_string(),
                body_text: text[sig.open_brace..=close].to_string(),
                source_span: span,
                line,
            });
        }

        self.report_unrecognized(text, &lines, &covered, &mut extraction);
        extraction
    }

    /// The comments of a gap between two definitions, or nothing when the gap
    /// holds code or its comments would unbalance a fragment.
    fn comment_block(&self, gap: &str) -> String {
        if first_code_offset(gap).is_some() {
            return String::new();
        }
        let comment = gap.trim();
        if comment.is_empty() || !balance(comment, self.scan_mode).is_balanced() {
            return String::new();
        }
        format!("{}\n", comment)
    }

    /// Count top-level lines that mention `Owner::` but were not claimed by
    /// any signature or definition.
    fn report_unrecognized(
        &self,
        text: &str,
        lines: &LineIndex,
        covered: &[Range<usize>],
        extraction: &mut Extraction,
    ) {
        let mut last_line = 0;
        for offset in self.matcher.mentions(text) {
            if covered.iter().any(|range| range.contains(&offset)) {
                continue;
            }
            let line = lines.line_of(offset);
            if line == last_line {
                continue;
            }
            last_line = line;

            let line_text = &text[lines.line_range(line, text)];
            let trimmed = line_text.trim_start();
            if trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*')
                || trimmed.starts_with('#')
            {
                continue;
            }

            tracing::warn!("line {}: unrecognized definition shape: {}", line, trimmed.trim_end());
            extraction.unrecognized += 1;
            extraction
                .diagnostics
                .push(Diagnostic::UnrecognizedSignatureShape {
                    line,
                    text: snippet(line_text, SNIPPET_CHARS),
                });
        }
    }
}

impl Extractor for FunctionExtractor {
    type Output = Extraction;

    fn extract(&self, text: &str) -> Extraction {
        self.extract_functions(text)
    }

    fn name(&self) -> &'static str {
        "functions"
    }
}

/// Reads member declarations of one owning type from a header.
#[derive(Debug, Clone)]
pub struct DeclarationExtractor {
    owner: String,
}

impl DeclarationExtractor {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
        }
    }
}

impl Extractor for DeclarationExtractor {
    type Output = Option<DeclaredMembers>;

    fn extract(&self, text: &str) -> Option<DeclaredMembers> {
        declared_members(text, &self.owner)
    }

    fn name(&self) -> &'static str {
        "declarations"
    }
}

/// Compare extracted definitions against declared members.
pub fn cross_reference(records: &[FunctionRecord], declared: &DeclaredMembers) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for record in records {
        if !declared.names.contains(&record.name) {
            diagnostics.push(Diagnostic::UndeclaredFunction {
                name: record.qualified_name(),
                line: record.line,
            });
        }
    }

    for name in &declared.names {
        if !records.iter().any(|r| &r.name == name) {
            diagnostics.push(Diagnostic::MissingDefinition { name: name.clone() });
        }
    }

    diagnostics
}
