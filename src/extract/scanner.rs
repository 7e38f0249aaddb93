//! Brace-depth scanning
//!
//! In `Literal` mode every `{` and `}` byte counts, including ones inside
//! string literals, char literals and comments. Input such as
//! `puts("{");` therefore shifts the depth and can end a body early or run
//! it past its real end. `Lexical` mode skips `//` and `/* */` comments and
//! quoted literals with backslash escapes; it does not understand raw string
//! literals, and a `'` directly between two digits is read as a digit
//! separator.

use crate::config::ScanMode;

/// Net and lowest running depth of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub net: i64,
    /// Lowest depth reached; negative means a `}` closed something opened earlier.
    pub lowest: i64,
}

impl Balance {
    pub fn is_balanced(&self) -> bool {
        self.net == 0 && self.lowest >= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    Open,
    Close,
}

/// Iterator over brace positions, honoring the scan mode.
struct BraceEvents<'a> {
    bytes: &'a [u8],
    pos: usize,
    mode: ScanMode,
}

impl<'a> BraceEvents<'a> {
    fn new(text: &'a str, start: usize, mode: ScanMode) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: start,
            mode,
        }
    }

    /// Position just past the literal opened by `quote` at `self.pos`.
    fn skip_quoted(&self, quote: u8) -> usize {
        let mut i = self.pos + 1;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return i + 1,
                b'\n' if quote == b'\'' => return i,
                _ => i += 1,
            }
        }
        self.bytes.len()
    }

    fn is_digit_separator(&self) -> bool {
        let prev = self.pos.checked_sub(1).map(|i| self.bytes[i]);
        let next = self.bytes.get(self.pos + 1).copied();
        matches!(prev, Some(p) if p.is_ascii_digit())
            && matches!(next, Some(n) if n.is_ascii_hexdigit())
    }
}

impl Iterator for BraceEvents<'_> {
    type Item = (usize, Delim);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let at = self.pos;
            let byte = self.bytes[at];

            match byte {
                b'{' => {
                    self.pos += 1;
                    return Some((at, Delim::Open));
                }
                b'}' => {
                    self.pos += 1;
                    return Some((at, Delim::Close));
                }
                _ if self.mode == ScanMode::Literal => self.pos += 1,
                b'/' if self.bytes.get(at + 1) == Some(&b'/') => {
                    self.pos = find_byte(self.bytes, at, b'\n').unwrap_or(self.bytes.len());
                }
                b'/' if self.bytes.get(at + 1) == Some(&b'*') => {
                    self.pos = find_block_comment_end(self.bytes, at + 2);
                }
                b'"' => self.pos = self.skip_quoted(b'"'),
                b'\'' if self.is_digit_separator() => self.pos += 1,
                b'\'' => self.pos = self.skip_quoted(b'\''),
                _ => self.pos += 1,
            }
        }
        None
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|i| from + i)
}

fn find_block_comment_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Offset of the `}` matching the `{` at `open`, or `None` when the text ends
/// first (or `open` is not a `{`).
pub fn find_matching_brace(text: &str, open: usize, mode: ScanMode) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 1usize;
    for (at, delim) in BraceEvents::new(text, open + 1, mode) {
        match delim {
            Delim::Open => depth += 1,
            Delim::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(at);
                }
            }
        }
    }
    None
}

/// Scan a whole piece of text and report its brace balance.
pub fn balance(text: &str, mode: ScanMode) -> Balance {
    let mut result = Balance::default();
    for (_, delim) in BraceEvents::new(text, 0, mode) {
        match delim {
            Delim::Open => result.net += 1,
            Delim::Close => {
                result.net -= 1;
                result.lowest = result.lowest.min(result.net);
            }
        }
    }
    result
}

/// Byte offset of the first character in `segment` that is neither
/// whitespace nor part of a comment.
pub fn first_code_offset(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = find_byte(bytes, i, b'\n').unwrap_or(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_block_comment_end(bytes, i + 2);
            }
            _ => {
                // Non-ASCII whitespace such as a BOM is not code either.
                let ch = segment[i..].chars().next()?;
                if ch.is_whitespace() || ch == '\u{FEFF}' {
                    i += ch.len_utf8();
                } else {
                    return Some(i);
                }
            }
        }
    }
    None
}
