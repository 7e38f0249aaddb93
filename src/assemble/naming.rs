//! Destination file naming

use std::path::PathBuf;

use crate::classify::Classification;
use crate::config::NamingConfig;
use crate::string_utils::sanitize_file_component;

/// Extension used when the input file has none.
const FALLBACK_EXTENSION: &str = "cpp";

/// Expands the naming templates for one run.
#[derive(Debug, Clone)]
pub struct FileNamer {
    templates: NamingConfig,
    owner: String,
    method: String,
    ext: String,
}

impl FileNamer {
    pub fn new(templates: &NamingConfig, owner: &str, method: &str, ext: Option<&str>) -> Self {
        Self {
            templates: templates.clone(),
            owner: sanitize_file_component(owner),
            method: sanitize_file_component(method),
            ext: ext
                .filter(|e| !e.is_empty())
                .unwrap_or(FALLBACK_EXTENSION)
                .to_string(),
        }
    }

    /// Path of the destination for `classification`, relative to the output root.
    pub fn path_for(&self, classification: &Classification) -> PathBuf {
        let expanded = match classification {
            Classification::Core => self.expand(&self.templates.core_file, ""),
            Classification::Dispatch(key) => {
                self.expand(&self.templates.dispatch_file, &sanitize_file_component(key))
            }
            Classification::Helper => self.expand(&self.templates.helper_file, ""),
        };
        expanded
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect()
    }

    fn expand(&self, template: &str, key: &str) -> String {
        template
            .replace("{owner}", &self.owner)
            .replace("{method}", &self.method)
            .replace("{key}", key)
            .replace("{ext}", &self.ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer() -> FileNamer {
        FileNamer::new(&NamingConfig::default(), "NewCodeGenerator", "visit", Some("cpp"))
    }

    #[test]
    fn test_default_templates() {
        let namer = namer();
        assert_eq!(
            namer.path_for(&Classification::Core),
            PathBuf::from("NewCodeGenerator_core.cpp")
        );
        assert_eq!(
            namer.path_for(&Classification::Dispatch("NumberLiteral".to_string())),
            PathBuf::from("gen_visit_NumberLiteral.cpp")
        );
        assert_eq!(
            namer.path_for(&Classification::Helper),
            PathBuf::from("helpers").join("gen_all_helpers.cpp")
        );
    }

    #[test]
    fn test_qualified_key_is_sanitized() {
        let path = namer().path_for(&Classification::Dispatch("ast::Leaf<int>".to_string()));
        assert_eq!(path, PathBuf::from("gen_visit_ast_Leaf_int.cpp"));
    }

    #[test]
    fn test_namespaced_owner_and_missing_extension() {
        let namer = FileNamer::new(&NamingConfig::default(), "ns::Foo", "visit", None);
        assert_eq!(
            namer.path_for(&Classification::Core),
            PathBuf::from("ns_Foo_core.cpp")
        );
    }

    #[test]
    fn test_custom_templates() {
        let templates = NamingConfig {
            core_file: "core/{owner}.{ext}".to_string(),
            dispatch_file: "./{method}/{key}.{ext}".to_string(),
            helper_file: "misc.{ext}".to_string(),
        };
        let namer = FileNamer::new(&templates, "Foo", "accept", Some("cc"));
        assert_eq!(
            namer.path_for(&Classification::Core),
            PathBuf::from("core").join("Foo.cc")
        );
        assert_eq!(
            namer.path_for(&Classification::Dispatch("Leaf".to_string())),
            PathBuf::from("accept").join("Leaf.cc")
        );
    }
}
