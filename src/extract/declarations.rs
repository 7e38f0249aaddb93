//! Member names declared in the companion declarations file
//!
//! The declarations file never drives the split. It is read so the summary can
//! point at names that were declared but never extracted (often a signature
//! the matcher missed) and at extracted names nobody declared.

use std::collections::BTreeSet;

use regex::Regex;
use std::sync::LazyLock;

use super::scanner::find_matching_brace;
use crate::config::ScanMode;

/// Names declared (and not defined inline) inside the owning type's body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredMembers {
    pub names: BTreeSet<String>,
}

static FIRST_CALLABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>~?[A-Za-z_]\w*|operator\s*(?:\(\)|\[\]|[^\w\s(]+))\s*\(")
        .expect("FIRST_CALLABLE regex is invalid")
});

/// Words that can sit directly before `(` without naming a member.
const NOT_MEMBER_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "return", "sizeof", "alignof", "alignas", "decltype",
    "static_assert", "noexcept", "void", "int", "bool", "char", "auto", "double", "float",
    "long", "short", "unsigned", "signed", "explicit", "virtual",
];

/// Find `class Owner { ... }` / `struct Owner { ... }` in `header` and list the
/// member functions it declares without a body.
///
/// Returns `None` when the type body cannot be found.
pub fn declared_members(header: &str, owner: &str) -> Option<DeclaredMembers> {
    // The class is declared with its unqualified name.
    let short = owner.rsplit("::").next().unwrap_or(owner);
    let class_head = Regex::new(&format!(
        r"\b(?:class|struct)\s+(?:\w+\s+)*{}\b[^;{{]*\{{",
        regex::escape(short)
    ))
    .ok()?;

    let head = class_head.find(header)?;
    let open = head.end() - 1;
    let close = find_matching_brace(header, open, ScanMode::Lexical)?;
    let body = &header[open + 1..close];

    let mut names = BTreeSet::new();
    for statement in top_level_statements(body) {
        if statement.inline_body || is_special_declaration(&statement.text) {
            continue;
        }
        if let Some(name) = member_name(&statement.text) {
            names.insert(name);
        }
    }

    Some(DeclaredMembers { names })
}

struct Statement {
    text: String,
    /// Ended by `{` rather than `;`.
    inline_body: bool,
}

/// Split a class body into statements at nesting depth zero. Anything inside
/// nested braces (inline bodies, nested types) is skipped.
fn top_level_statements(body: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in strip_comments(body).chars() {
        match ch {
            '{' => {
                if depth == 0 {
                    statements.push(Statement {
                        text: std::mem::take(&mut current),
                        inline_body: true,
                    });
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => statements.push(Statement {
                text: std::mem::take(&mut current),
                inline_body: false,
            }),
            _ if depth == 0 => current.push(ch),
            _ => {}
        }
    }
    statements
}

fn strip_comments(text: &str) -> String {
    static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)//[^\n]*|/\*.*?\*/").expect("COMMENT regex is invalid")
    });
    COMMENT.replace_all(text, " ").into_owned()
}

fn is_special_declaration(text: &str) -> bool {
    let compact: String = text.split_whitespace().collect();
    compact.ends_with("=0")
        || compact.ends_with("=default")
        || compact.ends_with("=delete")
        || compact.starts_with("friend")
        || compact.starts_with("using")
        || compact.starts_with("typedef")
}

fn member_name(statement: &str) -> Option<String> {
    // Drop access specifiers that share the statement with the declaration.
    let text = statement
        .rsplit_once("public:")
        .or_else(|| statement.rsplit_once("protected:"))
        .or_else(|| statement.rsplit_once("private:"))
        .map_or(statement, |(_, rest)| rest);

    FIRST_CALLABLE
        .captures_iter(text)
        .filter_map(|caps| caps.name("name"))
        .map(|m| m.as_str().split_whitespace().collect::<String>())
        .find(|name| !NOT_MEMBER_NAMES.contains(&name.as_str()))
}
