//! Stylesheet cleaning ahead of rule parsing.
//!
//! Strips everything the rule parser must never see: comments, `@charset`,
//! `@import`, `@page`, `@font-face` and every other at-rule, plus `@media`
//! blocks whose query an email client would not apply. Supported `@media`
//! blocks are unwrapped so their rules join the main cascade.
//!
//! Quoted strings and `url(...)` arguments are copied through untouched, so
//! `//` in `url(http://...)` or inside a base64 `data:` payload is never
//! mistaken for a comment and an `@` inside them never starts an at-rule.

use crate::selector::skip_ident;

/// [Media Queries Level 4 § 2.3 Media types](https://www.w3.org/TR/mediaqueries-4/#media-types)
///
/// Media types that apply when the message is displayed.
const SUPPORTED_MEDIA_TYPES: &[&str] = &["screen", "projection", "all"];

/// The result of cleaning one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedStylesheet {
    /// CSS ready for [`crate::parser::RuleTable::parse`].
    pub css: String,
    /// Every removed unsupported `@media` block, verbatim, in source order.
    pub unsupported_media: Vec<String>,
}

/// Clean raw stylesheet text for rule parsing.
///
/// Never fails: unbalanced braces and truncated at-rules are dropped.
#[must_use]
pub fn clean(raw: &str) -> String {
    clean_with_media(raw).css
}

/// Clean raw stylesheet text, also returning the unsupported `@media` blocks
/// that were removed so a caller can keep them in the document.
#[must_use]
pub fn clean_with_media(raw: &str) -> CleanedStylesheet {
    let without_comments = strip_comments(raw);
    let collapsed = collapse_line_breaks(&without_comments);

    let mut cleaned = CleanedStylesheet::default();
    strip_at_rules(&collapsed, &mut cleaned);
    cleaned
}

/// [CSS Syntax § 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
///
/// Remove `/* */` block comments, `//` line comments and the `<!--` / `-->`
/// delimiters some authors wrap `<style>` bodies in. An unterminated block
/// comment swallows the rest of the input.
fn strip_comments(css: &str) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_literal(bytes, i) {
            i = end;
            continue;
        }

        let comment_end = if bytes[i..].starts_with(b"/*") {
            Some(find(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2))
        } else if bytes[i..].starts_with(b"//") {
            Some(find(bytes, i + 2, b"\n").unwrap_or(bytes.len()))
        } else if bytes[i..].starts_with(b"<!--") {
            Some(i + 4)
        } else if bytes[i..].starts_with(b"-->") {
            Some(i + 3)
        } else {
            None
        };

        match comment_end {
            Some(end) => {
                out.push_str(&css[copied..i]);
                i = end;
                copied = end;
            }
            None => i += 1,
        }
    }

    out.push_str(&css[copied..]);
    out
}

/// Replace every line break with a single space.
fn collapse_line_breaks(css: &str) -> String {
    css.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// [CSS Syntax § 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-an-at-rule)
///
/// Copy `css` into `cleaned.css` with every at-rule removed. Supported
/// `@media` blocks are replaced by their (recursively cleaned) body.
fn strip_at_rules(css: &str, cleaned: &mut CleanedStylesheet) {
    let bytes = css.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_literal(bytes, i) {
            i = end;
            continue;
        }
        if bytes[i] != b'@' || !starts_at_keyword(css, i + 1) {
            i += 1;
            continue;
        }

        cleaned.css.push_str(&css[copied..i]);
        let rule = AtRule::scan(css, i);
        if rule.name.eq_ignore_ascii_case("media") {
            if let Some(body) = rule.body {
                if is_supported_media(rule.prelude) {
                    strip_at_rules(body, cleaned);
                    cleaned.css.push(' ');
                } else {
                    cleaned
                        .unsupported_media
                        .push(css[i..rule.end].trim().to_string());
                }
            }
        }
        i = rule.end;
        copied = rule.end;
    }

    cleaned.css.push_str(&css[copied..]);
}

/// Whether an at-keyword name starts at `start`.
fn starts_at_keyword(css: &str, start: usize) -> bool {
    css[start..]
        .chars()
        .next()
        .is_some_and(|c| c == '-' || c.is_alphabetic())
}

/// One at-rule located in the source text.
struct AtRule<'a> {
    /// The at-keyword without `@`.
    name: &'a str,
    /// Everything between the keyword and `;` or `{`.
    prelude: &'a str,
    /// The block contents, for block at-rules.
    body: Option<&'a str>,
    /// Byte offset just past the rule.
    end: usize,
}

impl<'a> AtRule<'a> {
    /// Scan the at-rule whose `@` is at `start`.
    ///
    /// A statement at-rule ends at its `;`, a block at-rule at the `}`
    /// balancing its `{`. Whichever is missing, the rule runs to the end of
    /// the input.
    fn scan(css: &'a str, start: usize) -> Self {
        let bytes = css.as_bytes();
        let name_end = skip_ident(css, start + 1);
        let name = &css[start + 1..name_end];

        let mut i = name_end;
        while i < bytes.len() {
            if let Some(end) = skip_literal(bytes, i) {
                i = end;
                continue;
            }
            match bytes[i] {
                b';' => {
                    return Self {
                        name,
                        prelude: &css[name_end..i],
                        body: None,
                        end: i + 1,
                    };
                }
                b'{' => {
                    let close = matching_brace(bytes, i + 1);
                    return Self {
                        name,
                        prelude: &css[name_end..i],
                        body: Some(&css[i + 1..close]),
                        end: (close + 1).min(bytes.len()),
                    };
                }
                _ => i += 1,
            }
        }

        Self {
            name,
            prelude: &css[name_end..],
            body: None,
            end: bytes.len(),
        }
    }
}

/// [Media Queries Level 4 § 3 Syntax](https://www.w3.org/TR/mediaqueries-4/#mq-syntax)
///
/// A query is supported when every comma-separated item is one of the
/// [`SUPPORTED_MEDIA_TYPES`], optionally prefixed with `only`. Media
/// features and any other compound query are unsupported.
#[must_use]
pub fn is_supported_media(query: &str) -> bool {
    query.split(',').all(|item| {
        let mut words = item.split_whitespace();
        let medium = match words.next() {
            Some(word) if word.eq_ignore_ascii_case("only") => words.next(),
            other => other,
        };
        medium.is_some_and(|medium| {
            SUPPORTED_MEDIA_TYPES
                .iter()
                .any(|supported| medium.eq_ignore_ascii_case(supported))
        }) && words.next().is_none()
    })
}

/// If a quoted string or `url(...)` starts at `i`, return the offset just
/// past it. Unterminated literals run to the end of the input.
fn skip_literal(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'"' | b'\'' => Some(skip_string(bytes, i)),
        b'u' | b'U'
            if bytes.len() >= i + 4
                && bytes[i..i + 4].eq_ignore_ascii_case(b"url(")
                && (i == 0 || !is_ident_byte(bytes[i - 1])) =>
        {
            Some(skip_url(bytes, i + 4))
        }
        _ => None,
    }
}

fn skip_string(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            byte if byte == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_url(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'\\' => i += 2,
            b')' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Offset of the `}` balancing an already consumed `{`, or the end of input.
fn matching_brace(bytes: &[u8], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        if let Some(end) = skip_literal(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return i,
            b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

const fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || !byte.is_ascii()
}
