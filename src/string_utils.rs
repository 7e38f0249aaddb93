//! String utility functions for signature text handling.

/// Strip the first matching prefix from a string.
///
/// Iterates through the provided prefixes and returns the string with
/// the first matching prefix removed. If no prefix matches, returns the
/// original string unchanged.
///
/// # Example
///
/// ```
/// use cleave::string_utils::strip_any_prefix;
///
/// const QUALIFIERS: &[&str] = &["const ", "volatile "];
/// assert_eq!(strip_any_prefix("const Node& n", QUALIFIERS), "Node& n");
/// assert_eq!(strip_any_prefix("Node& n", QUALIFIERS), "Node& n");
/// ```
pub fn strip_any_prefix<'a>(s: &'a str, prefixes: &[&str]) -> &'a str {
    for prefix in prefixes {
        if let Some(stripped) = s.strip_prefix(prefix) {
            return stripped;
        }
    }
    s
}

/// Collapse every run of whitespace (including newlines) into one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on `sep` only where it is not nested inside `()`, `<>` or `[]`.
///
/// Used for parameter lists, where template arguments carry their own commas.
///
/// ```
/// use cleave::string_utils::split_top_level;
///
/// let parts = split_top_level("std::map<int, int>& m, int x", ',');
/// assert_eq!(parts, vec!["std::map<int, int>& m", " int x"]);
/// ```
pub fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (idx, ch) in s.char_indices() {
        match ch {
            '(' | '<' | '[' => depth += 1,
            ')' | '>' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Turn arbitrary type text into something safe to embed in a file name.
///
/// Runs of characters outside `[A-Za-z0-9_-]` become a single `_`, and
/// leading/trailing underscores are trimmed.
pub fn sanitize_file_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_sep = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    out.trim_matches('_').to_string()
}

/// Shorten a line of source for display in a diagnostic.
pub fn snippet(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
