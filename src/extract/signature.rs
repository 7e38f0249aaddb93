//! Signature matching for member-function definitions
//!
//! One regex, built per owning type, recognizes
//!
//! ```text
//! [return type] Owner::name ( params ) [const|noexcept|override|...] [: init-list] {
//! ```
//!
//! With `multiline` off every piece has to sit on the line of the opening
//! brace; with it on, whitespace between pieces may include newlines. The
//! match always begins at the start of a line. Parameter lists may nest one
//! level of parentheses and initializer lists may use brace initializers.

use regex::Regex;

use crate::diagnostics::SplitError;

/// A matched signature, up to and including its opening brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    /// Offset where the signature text begins (start of its first line).
    pub start: usize,
    /// Offset of the opening `{`.
    pub open_brace: usize,
    pub return_type: String,
    pub name: String,
    pub params: String,
    pub is_const: bool,
}

/// Finds definition signatures for one owning type.
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    owner: String,
    pattern: Regex,
    mention: Regex,
}

impl SignatureMatcher {
    pub fn new(owner: &str, multiline: bool) -> Result<Self, SplitError> {
        let build = |source: String| {
            Regex::new(&source).map_err(|source| SplitError::Pattern {
                owner: owner.to_string(),
                source,
            })
        };

        let pattern = build(signature_pattern(owner, multiline))?;
        let mention = build(format!(r"\b{}::", regex::escape(owner)))?;

        Ok(Self {
            owner: owner.to_string(),
            pattern,
            mention,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// All signature matches in `text`, in order of appearance.
    pub fn find_all(&self, text: &str) -> Vec<SignatureMatch> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let quals = caps.name("quals").map_or("", |m| m.as_str());
                Some(SignatureMatch {
                    start: whole.start(),
                    open_brace: whole.end() - 1,
                    return_type: caps
                        .name("ret")
                        .map_or("", |m| m.as_str())
                        .trim()
                        .to_string(),
                    name: caps.name("name")?.as_str().split_whitespace().collect(),
                    params: caps.name("params").map_or("", |m| m.as_str()).to_string(),
                    is_const: quals.split_whitespace().any(|q| q == "const"),
                })
            })
            .collect()
    }

    /// Offsets of every `Owner::` occurrence in `text`.
    pub fn mentions(&self, text: &str) -> Vec<usize> {
        self.mention.find_iter(text).map(|m| m.start()).collect()
    }
}

fn signature_pattern(owner: &str, multiline: bool) -> String {
    let ws = if multiline { r"\s" } else { r"[ \t]" };
    // One level of nested parentheses, as in `std::function<void(int)>`.
    let params = if multiline {
        r"(?:[^()]|\([^()]*\))*"
    } else {
        r"(?:[^()\n]|\([^()\n]*\))*"
    };
    // Brace initializers (`x_{1}`) must be tried before the plain character
    // class, otherwise their `{` is taken for the body.
    let init = if multiline {
        r"(?:\w[ \t]*\{[^{};]*\}|[^{;])*"
    } else {
        r"(?:\w[ \t]*\{[^{};\n]*\}|[^{;\n])*"
    };
    let owner = regex::escape(owner);

    format!(
        concat!(
            r"(?m)^(?P<ret>[ \t]*(?:[A-Za-z_:][\w{ws}\*&:<>,\.]*?)?)",
            r"\b{owner}::",
            r"(?P<name>~?[A-Za-z_]\w*|operator{ws}*(?:\(\)|\[\]|[^\w\s(]+))",
            r"{ws}*\((?P<params>{params})\)",
            r"(?P<quals>(?:{ws}*(?:const\b|volatile\b|noexcept\b|override\b|final\b|&&|&))*)",
            r"(?:{ws}*:{init})?",
            r"{ws}*\{{",
        ),
        ws = ws,
        owner = owner,
        params = params,
        init = init,
    )
}
