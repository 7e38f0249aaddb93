//! Grouping classified functions into destination files
//!
//! # Module Structure
//!
//! - `naming` - destination paths from naming templates
//! - `preamble` - per-group include lines
//! - `aggregator` - the rewritten input file and its safety gate

pub mod aggregator;
pub mod naming;
pub mod preamble;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::classify::{Classification, Classified};
use crate::config::ScanMode;
use crate::diagnostics::Diagnostic;
use crate::extract::{Balance, FunctionRecord, balance};

pub use aggregator::{
    AggregatorFile, GateInputs, Interstitial, WithholdReason, reference_path, render_reference,
    scan_interstitial, withhold_reasons,
};
pub use naming::FileNamer;
pub use preamble::{PreambleBuilder, prefix_includes};

/// One output file and the functions it receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFile {
    /// Classification of the first function placed here.
    pub classification: Classification,
    /// Relative to the output root.
    pub path: PathBuf,
    pub preamble_lines: Vec<String>,
    /// Functions in first-encountered order.
    pub ordered_bodies: Vec<FunctionRecord>,
}

impl DestinationFile {
    /// Preamble, a blank line, then each definition separated by a blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.preamble_lines.is_empty() {
            out.push_str(&self.preamble_lines.join("\n"));
            out.push_str("\n\n");
        }
        let definitions: Vec<String> = self
            .ordered_bodies
            .iter()
            .map(FunctionRecord::definition_text)
            .collect();
        out.push_str(&definitions.join("\n\n"));
        out.push('\n');
        out
    }

    pub fn function_names(&self) -> Vec<String> {
        self.ordered_bodies
            .iter()
            .map(FunctionRecord::qualified_name)
            .collect()
    }
}

/// Re-scan rendered content. A file built from well-formed bodies balances
/// unless the preamble itself carries braces.
pub fn verify_balance(content: &str, mode: ScanMode) -> Balance {
    balance(content, mode)
}

/// Destination files in first-populated order.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub destinations: Vec<DestinationFile>,
    pub diagnostics: Vec<Diagnostic>,
    pub duplicates: usize,
}

/// Group records by destination path, dropping repeated definitions of the
/// same overload within one file.
pub fn group(
    records: &[FunctionRecord],
    classified: &[Classified],
    namer: &FileNamer,
    preambles: &PreambleBuilder,
) -> Grouping {
    let mut grouping = Grouping::default();
    let mut by_path: HashMap<PathBuf, usize> = HashMap::new();
    // Per destination: overload key -> line of the kept definition.
    let mut seen: Vec<HashMap<String, usize>> = Vec::new();

    for (record, class) in records.iter().zip(classified) {
        let path = namer.path_for(&class.classification);
        let index = *by_path.entry(path.clone()).or_insert_with(|| {
            grouping.destinations.push(DestinationFile {
                classification: class.classification.clone(),
                path: path.clone(),
                preamble_lines: preambles.lines_for(&class.classification),
                ordered_bodies: Vec::new(),
            });
            seen.push(HashMap::new());
            grouping.destinations.len() - 1
        });

        let key = record.overload_key();
        if let Some(&first_line) = seen[index].get(&key) {
            tracing::warn!(
                "line {}: `{}` already defined at line {}, dropping the later definition",
                record.line,
                key,
                first_line
            );
            grouping.duplicates += 1;
            grouping.diagnostics.push(Diagnostic::DuplicateDefinition {
                name: record.qualified_name(),
                line: record.line,
                first_line,
                destination: path,
            });
            continue;
        }

        seen[index].insert(key, record.line);
        grouping.destinations[index].ordered_bodies.push(record.clone());
    }

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, classify_all};
    use crate::config::{NamingConfig, SplitConfig};
    use crate::extract::{Extractor, FunctionExtractor};
    use std::collections::BTreeSet;

    const SOURCE: &str = "\
#include \"Foo.h\"

int Foo::bar() { return 1; }

void Foo::visit(NumberLiteral& node) { x(); }

void Foo::log(const char* msg) {
}

void Foo::visit(NumberLiteral &other) { y(); }

void Foo::log(int level) {
}
";

    fn grouped(config: &SplitConfig) -> Grouping {
        let records = FunctionExtractor::from_config("Foo", config)
            .unwrap()
            .extract(SOURCE)
            .records;
        let (classified, _) = classify_all(&Classifier::from_config(config), &records);
        let namer = FileNamer::new(&NamingConfig::default(), "Foo", "visit", Some("cpp"));
        let preambles = PreambleBuilder::new(config, Some("Foo.h"), "#include \"Foo.h\"\n");
        group(&records, &classified, &namer, &preambles)
    }

    fn config() -> SplitConfig {
        SplitConfig {
            core_functions: BTreeSet::from(["Foo::bar".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_populated_order() {
        let grouping = grouped(&config());
        let paths: Vec<_> = grouping.destinations.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("Foo_core.cpp"),
                PathBuf::from("gen_visit_NumberLiteral.cpp"),
                PathBuf::from("helpers").join("gen_all_helpers.cpp"),
            ]
        );
    }

    #[test]
    fn test_overloads_kept_and_duplicates_dropped() {
        let grouping = grouped(&config());

        let helpers = &grouping.destinations[2];
        assert_eq!(helpers.function_names(), vec!["Foo::log", "Foo::log"]);

        let dispatch = &grouping.destinations[1];
        assert_eq!(dispatch.ordered_bodies.len(), 1);
        assert!(dispatch.ordered_bodies[0].body_text.contains("x();"));

        assert_eq!(grouping.duplicates, 1);
        assert!(matches!(
            &grouping.diagnostics[0],
            Diagnostic::DuplicateDefinition { name, line: 10, first_line: 5, .. }
                if name == "Foo::visit"
        ));
    }

    #[test]
    fn test_render_destination() {
        let grouping = grouped(&config());
        let core = grouping.destinations[0].render();
        assert_eq!(core, "#include \"Foo.h\"\n\nint Foo::bar() { return 1; }\n");
        assert!(verify_balance(&core, ScanMode::Literal).is_balanced());
    }

    #[test]
    fn test_render_joins_definitions_with_blank_line() {
        let grouping = grouped(&config());
        let helpers = grouping.destinations[2].render();
        assert_eq!(
            helpers,
            "#include \"Foo.h\"\n\nvoid Foo::log(const char* msg) {\n}\n\nvoid Foo::log(int level) {\n}\n"
        );
    }

    #[test]
    fn test_unbalanced_preamble_detected() {
        let file = DestinationFile {
            classification: Classification::Helper,
            path: PathBuf::from("h.cpp"),
            preamble_lines: vec!["namespace ns {".to_string()],
            ordered_bodies: Vec::new(),
        };
        assert_eq!(verify_balance(&file.render(), ScanMode::Literal).net, 1);
    }
}
