//! Statement splitting.
//!
//! Backends that can only run one statement per call break a script into
//! statements first. Two strategies are available:
//!
//! - [`SplitMode::Naive`] splits on every `;`. This is what hosted SQL
//!   editors historically did and is kept as the default for parity. It
//!   corrupts any script with a `;` inside a string literal, a comment or a
//!   dollar-quoted function body.
//! - [`SplitMode::Aware`] understands `'...'` / `E'...'` literals, quoted
//!   identifiers, `--` and nested `/* */` comments, and `$tag$...$tag$`
//!   bodies. Fragments that hold nothing but comments are dropped.

use serde::{Deserialize, Serialize};

/// How to split a script into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Split on every `;`.
    #[default]
    Naive,
    /// Split on `;` outside literals, comments and dollar quotes.
    Aware,
}

/// Split a script into trimmed, non-empty statements.
pub fn split_statements(body: &str, mode: SplitMode) -> Vec<&str> {
    match mode {
        SplitMode::Naive => split_naive(body),
        SplitMode::Aware => split_aware(body),
    }
}

fn split_naive(body: &str) -> Vec<&str> {
    body.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_aware(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let len = bytes.len();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\'' => {
                let escapes = i > 0
                    && matches!(bytes[i - 1], b'E' | b'e')
                    && (i < 2 || !is_ident_byte(bytes[i - 2]));
                i = skip_quoted(bytes, i + 1, b'\'', escapes);
                has_code = true;
            }
            b'"' => {
                i = skip_quoted(bytes, i + 1, b'"', false);
                has_code = true;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(len, |p| i + p + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i + 2);
            }
            b'$' if i == 0 || !is_ident_byte(bytes[i - 1]) => match dollar_tag(bytes, i) {
                Some(tag_len) => {
                    let tag = &bytes[i..i + tag_len];
                    let body_start = i + tag_len;
                    i = find(bytes, body_start, tag).map_or(len, |p| p + tag_len);
                    has_code = true;
                }
                None => {
                    i += 1;
                    has_code = true;
                }
            },
            b';' => {
                let stmt = body[start..i].trim();
                if has_code && !stmt.is_empty() {
                    statements.push(stmt);
                }
                i += 1;
                start = i;
                has_code = false;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                i += 1;
                has_code = true;
            }
        }
    }

    let tail = body[start..].trim();
    if has_code && !tail.is_empty() {
        statements.push(tail);
    }

    statements
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Index just past the closing quote, treating a doubled quote as literal.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8, backslash_escapes: bool) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        if backslash_escapes && b == b'\\' {
            i += 2;
        } else if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Index just past the matching `*/`; block comments nest in PostgreSQL.
fn skip_block_comment(bytes: &[u8], mut i: usize) -> usize {
    let mut depth = 1;
    while i < bytes.len() {
        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// Length of a `$tag$` opener at `i`, if there is one.
fn dollar_tag(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i + 1;
    if let Some(&first) = bytes.get(j) {
        if first.is_ascii_digit() {
            return None;
        }
    }
    while let Some(&b) = bytes.get(j) {
        if b == b'$' {
            return Some(j - i + 1);
        }
        if !(b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80) {
            return None;
        }
        j += 1;
    }
    None
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}
