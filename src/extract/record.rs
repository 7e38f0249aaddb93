//! Extracted function records

use std::ops::Range;

use regex::Regex;
use std::sync::LazyLock;

use crate::string_utils::{collapse_whitespace, split_top_level, strip_any_prefix};

/// One member-function definition located in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub owner_type: String,
    pub name: String,
    /// Raw text between the parameter parentheses.
    pub param_list: String,
    pub is_const: bool,
    /// Comment block standing alone between the previous definition and this
    /// one, newline-terminated; empty when there is none.
    pub leading_comment: String,
    /// Signature text up to, not including, the opening brace.
    pub signature_prefix: String,
    /// Opening brace through matching closing brace, inclusive.
    pub body_text: String,
    /// Byte range of the whole definition in the input.
    pub source_span: Range<usize>,
    /// 1-based line where the signature starts.
    pub line: usize,
}

impl FunctionRecord {
    /// `Owner::name`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner_type, self.name)
    }

    /// The leading comment, then the definition exactly as it appeared in
    /// the input.
    pub fn definition_text(&self) -> String {
        format!(
            "{}{}{}",
            self.leading_comment, self.signature_prefix, self.body_text
        )
    }

    /// Offset of the opening brace in the input.
    pub fn body_start(&self) -> usize {
        self.source_span.start + self.signature_prefix.len()
    }

    /// Declared type of each parameter, whitespace-normalized and without
    /// parameter names or default values.
    pub fn param_types(&self) -> Vec<String> {
        if self.param_list.trim().is_empty() || self.param_list.trim() == "void" {
            return Vec::new();
        }
        split_top_level(&self.param_list, ',')
            .into_iter()
            .map(param_type)
            .collect()
    }

    /// Identity used to spot the same overload defined twice.
    pub fn overload_key(&self) -> String {
        format!(
            "{}({}){}",
            self.qualified_name(),
            self.param_types().join(","),
            if self.is_const { " const" } else { "" }
        )
    }

    /// Bare type of the first parameter with cv-qualifiers, elaborated-type
    /// keywords and reference/pointer markers removed.
    ///
    /// `const ast::Node& node` gives `ast::Node`.
    pub fn first_param_base_type(&self) -> Option<String> {
        let first = self.param_types().into_iter().next()?;
        let base = strip_decorations(&first);
        if base.is_empty() { None } else { Some(base) }
    }
}

const LEADING_QUALIFIERS: &[&str] = &[
    "const ",
    "volatile ",
    "struct ",
    "class ",
    "typename ",
    "enum ",
];

static TRAILING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<ty>.*?[\s\*&>])\s*[A-Za-z_]\w*\s*(?P<array>(?:\[[^\]]*\])*)$")
        .expect("TRAILING_NAME regex is invalid")
});

/// Type part of a single parameter declaration.
fn param_type(param: &str) -> String {
    let without_default = split_top_level(param, '=')
        .into_iter()
        .next()
        .unwrap_or_default();
    let normalized = collapse_whitespace(without_default);

    let ty = match TRAILING_NAME.captures(&normalized) {
        Some(caps) => {
            let ty = caps.name("ty").map_or("", |m| m.as_str()).trim_end();
            let array = caps.name("array").map_or("", |m| m.as_str());
            // A lone keyword before the name means the "name" was part of the type.
            if ty.is_empty() || is_type_keyword(ty) {
                normalized.clone()
            } else {
                format!("{}{}", ty, array)
            }
        }
        None => normalized.clone(),
    };
    ty.replace(" &", "&").replace(" *", "*")
}

fn is_type_keyword(ty: &str) -> bool {
    matches!(
        ty,
        "const" | "volatile" | "unsigned" | "signed" | "long" | "short" | "struct" | "class"
    )
}

fn strip_decorations(ty: &str) -> String {
    let mut rest = ty.trim();
    loop {
        let next = strip_any_prefix(rest, LEADING_QUALIFIERS).trim_start();
        if next.len() == rest.len() {
            break;
        }
        rest = next;
    }

    let unmarked = rest.replace(['&', '*'], " ");
    unmarked
        .split_whitespace()
        .filter(|token| !matches!(*token, "const" | "volatile"))
        .collect::<Vec<_>>()
        .join(" ")
}
