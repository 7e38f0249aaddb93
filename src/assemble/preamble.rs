//! Preamble lines for destination files

use std::collections::HashSet;

use crate::classify::Classification;
use crate::config::SplitConfig;

/// Builds the ordered, deduplicated preamble for each destination group.
#[derive(Debug, Clone, Default)]
pub struct PreambleBuilder {
    declarations_include: Option<String>,
    core: Vec<String>,
    dispatch: Vec<String>,
    helper: Vec<String>,
}

impl PreambleBuilder {
    /// `declarations_file` is the header name to include first in every
    /// preamble; `prefix` is the boilerplate preceding the first function.
    pub fn new(config: &SplitConfig, declarations_file: Option<&str>, prefix: &str) -> Self {
        let declarations_include = declarations_file
            .filter(|_| config.include_declarations_header)
            .map(|name| format!("#include \"{}\"", name));

        let mut core = config.preamble.core.clone();
        if config.core_keeps_prefix_includes {
            core.extend(prefix_includes(prefix));
        }

        Self {
            declarations_include,
            core,
            dispatch: config.preamble.dispatch.clone(),
            helper: config.preamble.helper.clone(),
        }
    }

    pub fn lines_for(&self, classification: &Classification) -> Vec<String> {
        let group = match classification {
            Classification::Core => &self.core,
            Classification::Dispatch(_) => &self.dispatch,
            Classification::Helper => &self.helper,
        };
        dedup_lines(self.declarations_include.iter().chain(group.iter()))
    }
}

/// `#include` lines of the boilerplate prefix, trimmed.
pub fn prefix_includes(prefix: &str) -> Vec<String> {
    prefix
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("#include"))
        .map(String::from)
        .collect()
}

/// Drop repeated lines (compared after trimming), keeping the first occurrence.
fn dedup_lines<'a>(lines: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .filter(|line| seen.insert(line.trim().to_string()))
        .cloned()
        .collect()
}
