//! Destination classification for extracted functions
//!
//! Rules are checked in a fixed order: core allowlist, dispatch method,
//! explicit helpers. A function no rule claims still lands in the helper
//! group, but with reason `Default` and a `MisclassifiedDefault` diagnostic so
//! the fall-through is never silent.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::config::{AllowlistMatch, SplitConfig};
use crate::diagnostics::Diagnostic;
use crate::extract::FunctionRecord;

/// Destination group of one function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "group", content = "key", rename_all = "lowercase")]
pub enum Classification {
    Core,
    /// One group per variant key.
    Dispatch(String),
    Helper,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Core => write!(f, "core"),
            Classification::Dispatch(key) => write!(f, "dispatch:{}", key),
            Classification::Helper => write!(f, "helper"),
        }
    }
}

/// Which rule produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationReason {
    CoreAllowlist,
    DispatchVariant,
    DispatchExcluded,
    ExplicitHelper,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub classification: Classification,
    pub reason: ClassificationReason,
}

impl Classified {
    fn new(classification: Classification, reason: ClassificationReason) -> Self {
        Self {
            classification,
            reason,
        }
    }
}

/// Rule registry built from a `SplitConfig`.
#[derive(Debug, Clone)]
pub struct Classifier {
    core: BTreeSet<String>,
    allowlist_match: AllowlistMatch,
    dispatch_method: String,
    exclusions: BTreeSet<String>,
    helpers: BTreeSet<String>,
}

impl Classifier {
    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            core: config.core_functions.clone(),
            allowlist_match: config.allowlist_match,
            dispatch_method: config.dispatch_method.clone(),
            exclusions: config.dispatch_exclusions.clone(),
            helpers: config.helper_functions.clone(),
        }
    }

    pub fn classify(&self, record: &FunctionRecord) -> Classified {
        if self.is_core(record) {
            return Classified::new(Classification::Core, ClassificationReason::CoreAllowlist);
        }

        if record.name == self.dispatch_method {
            if let Some(key) = record.first_param_base_type() {
                if self.is_excluded(&key) {
                    return Classified::new(
                        Classification::Helper,
                        ClassificationReason::DispatchExcluded,
                    );
                }
                return Classified::new(
                    Classification::Dispatch(key),
                    ClassificationReason::DispatchVariant,
                );
            }
        }

        if names_match(&self.helpers, record, AllowlistMatch::Exact) {
            return Classified::new(Classification::Helper, ClassificationReason::ExplicitHelper);
        }

        Classified::new(Classification::Helper, ClassificationReason::Default)
    }

    /// Why `record` fell through to the default branch, for diagnostics.
    fn default_reason(&self, record: &FunctionRecord) -> String {
        if record.name == self.dispatch_method {
            format!("`{}` overload without a parameter type", self.dispatch_method)
        } else {
            "no rule matched".to_string()
        }
    }

    fn is_core(&self, record: &FunctionRecord) -> bool {
        names_match(&self.core, record, self.allowlist_match)
    }

    /// Exclusions name either the full key or its unqualified tail.
    fn is_excluded(&self, key: &str) -> bool {
        let tail = key.rsplit("::").next().unwrap_or(key);
        self.exclusions.contains(key) || self.exclusions.contains(tail)
    }
}

/// Entries containing `::` are compared against the qualified name, others
/// against the bare method name.
fn names_match(entries: &BTreeSet<String>, record: &FunctionRecord, mode: AllowlistMatch) -> bool {
    let qualified = record.qualified_name();
    entries.iter().any(|entry| {
        let target = if entry.contains("::") {
            qualified.as_str()
        } else {
            record.name.as_str()
        };
        match mode {
            AllowlistMatch::Exact => target == entry,
            AllowlistMatch::Substring => target.contains(entry.as_str()),
        }
    })
}

/// Classify every record, emitting a `MisclassifiedDefault` diagnostic for each
/// one that reached the default branch.
pub fn classify_all(
    classifier: &Classifier,
    records: &[FunctionRecord],
) -> (Vec<Classified>, Vec<Diagnostic>) {
    let mut classified = Vec::with_capacity(records.len());
    let mut diagnostics = Vec::new();

    for record in records {
        let result = classifier.classify(record);
        if result.reason == ClassificationReason::Default {
            let reason = classifier.default_reason(record);
            tracing::warn!(
                "line {}: `{}` routed to helpers by default ({})",
                record.line,
                record.qualified_name(),
                reason
            );
            diagnostics.push(Diagnostic::MisclassifiedDefault {
                name: record.qualified_name(),
                line: record.line,
                reason,
            });
        } else {
            tracing::debug!(
                "`{}` -> {} ({:?})",
                record.qualified_name(),
                result.classification,
                result.reason
            );
        }
        classified.push(result);
    }

    (classified, diagnostics)
}
