//! Run configuration and `cleave.toml` loading
//!
//! Every option has a default, so an absent config file is the same as an
//! empty one. The CLI layers its flags on top of whatever was loaded.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::SplitError;

/// Config file looked up beside the input when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "cleave.toml";

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "generators";
pub const DEFAULT_DISPATCH_METHOD: &str = "visit";
pub const DEFAULT_REFERENCE_TEMPLATE: &str = "#include \"{path}\"";

/// How the brace scanner treats literals and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Count every `{` and `}` character, wherever it appears.
    #[default]
    Literal,
    /// Ignore braces inside comments, string literals and char literals.
    Lexical,
}

/// How core allowlist entries are compared against qualified names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowlistMatch {
    /// The entry must equal the qualified (or bare) name.
    #[default]
    Exact,
    /// The entry may appear anywhere in the qualified name.
    Substring,
}

/// Static include lines placed at the top of each destination group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreambleConfig {
    pub core: Vec<String>,
    pub dispatch: Vec<String>,
    pub helper: Vec<String>,
}

/// File name templates, relative to the output directory.
///
/// Placeholders: `{owner}`, `{method}`, `{key}`, `{ext}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub core_file: String,
    pub dispatch_file: String,
    pub helper_file: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            core_file: "{owner}_core.{ext}".to_string(),
            dispatch_file: "gen_{method}_{key}.{ext}".to_string(),
            helper_file: "helpers/gen_all_helpers.{ext}".to_string(),
        }
    }
}

/// Everything that controls one splitting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Owning type whose member functions are split. Defaults to the input file stem.
    pub owner_type: Option<String>,
    /// Output root. Relative paths are resolved against the input file's directory.
    pub output_directory: PathBuf,
    /// Qualified (`Owner::name`) or bare names that stay in the core file.
    pub core_functions: BTreeSet<String>,
    pub allowlist_match: AllowlistMatch,
    /// Method overloaded once per variant type.
    pub dispatch_method: String,
    /// Variant keys whose dispatch overloads go to the helper file instead.
    pub dispatch_exclusions: BTreeSet<String>,
    /// Names deliberately routed to the helper file.
    pub helper_functions: BTreeSet<String>,
    /// Allow a signature to wrap across lines before its opening brace.
    pub multiline_signatures: bool,
    pub scan_mode: ScanMode,
    pub preamble: PreambleConfig,
    pub naming: NamingConfig,
    /// Line written into the aggregator for each destination; `{path}` is substituted.
    pub reference_template: String,
    /// Lines placed above the preserved prefix in the aggregator.
    pub aggregator_banner: Vec<String>,
    /// Put an include of the declarations file first in every preamble.
    pub include_declarations_header: bool,
    /// Copy the prefix's `#include` lines into the core preamble.
    pub core_keeps_prefix_includes: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            owner_type: None,
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            core_functions: BTreeSet::new(),
            allowlist_match: AllowlistMatch::default(),
            dispatch_method: DEFAULT_DISPATCH_METHOD.to_string(),
            dispatch_exclusions: BTreeSet::new(),
            helper_functions: BTreeSet::new(),
            multiline_signatures: true,
            scan_mode: ScanMode::default(),
            preamble: PreambleConfig::default(),
            naming: NamingConfig::default(),
            reference_template: DEFAULT_REFERENCE_TEMPLATE.to_string(),
            aggregator_banner: Vec::new(),
            include_declarations_header: true,
            core_keeps_prefix_includes: true,
        }
    }
}

impl SplitConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, SplitError> {
        let contents = fs::read_to_string(path).map_err(|source| SplitError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents, path)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML config text. `origin` is only used in errors.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, SplitError> {
        let config: SplitConfig =
            toml::from_str(contents).map_err(|source| SplitError::ParseConfig {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<(), SplitError> {
        if let Some(owner) = &self.owner_type {
            if !is_qualified_identifier(owner) {
                return Err(SplitError::InvalidConfig(format!(
                    "owner_type `{}` is not an identifier",
                    owner
                )));
            }
        }
        if !is_identifier(&self.dispatch_method) {
            return Err(SplitError::InvalidConfig(format!(
                "dispatch_method `{}` is not an identifier",
                self.dispatch_method
            )));
        }
        if !self.naming.dispatch_file.contains("{key}") {
            return Err(SplitError::InvalidConfig(
                "naming.dispatch_file must contain {key}".to_string(),
            ));
        }
        for (label, template) in [
            ("naming.core_file", &self.naming.core_file),
            ("naming.helper_file", &self.naming.helper_file),
        ] {
            if template.trim().is_empty() {
                return Err(SplitError::InvalidConfig(format!("{} is empty", label)));
            }
        }
        if self.naming.core_file == self.naming.helper_file {
            return Err(SplitError::InvalidConfig(
                "naming.core_file and naming.helper_file name the same file".to_string(),
            ));
        }
        if !self.reference_template.contains("{path}") {
            return Err(SplitError::InvalidConfig(
                "reference_template must contain {path}".to_string(),
            ));
        }
        Ok(())
    }

    /// The owning type for this run: configured, or the input file's stem.
    pub fn resolve_owner(&self, input: &Path) -> Result<String, SplitError> {
        if let Some(owner) = &self.owner_type {
            return Ok(owner.clone());
        }
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if is_identifier(stem) {
            Ok(stem.to_string())
        } else {
            Err(SplitError::InvalidConfig(format!(
                "cannot infer owner type from `{}`; pass --owner",
                input.display()
            )))
        }
    }
}

/// Pick the config file for a run: the explicit one, else `cleave.toml`
/// beside the input if it exists.
pub fn locate_config(explicit: Option<&Path>, input: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = input
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if candidate.is_file() {
        Some(candidate)
    } else {
        tracing::debug!("no {} beside input, using defaults", CONFIG_FILE_NAME);
        None
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_qualified_identifier(s: &str) -> bool {
    s.split("::").all(is_identifier)
}
