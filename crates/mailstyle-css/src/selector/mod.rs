//! CSS selector scoring
//!
//! The inliner never executes selectors; that is the selector engine's job.
//! This module only answers questions about selector *text*: how specific it
//! is per [Selectors Level 4 § 17](https://www.w3.org/TR/selectors-4/#specificity-rules),
//! whether it names pseudo-classes or pseudo-elements, and whether the rule
//! behind it can be inlined at all.

mod specificity;

pub use specificity::{Specificity, specificity};

/// Whether a pseudo-class takes a parenthesised argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arguments {
    None,
    Required,
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
///
/// Pseudo-classes that count toward specificity. Longer names come before
/// any name they start with, so `first-child` is tried before `first`.
const PSEUDO_CLASSES: &[(&str, Arguments)] = &[
    ("nth-last-of-type", Arguments::Required),
    ("nth-last-child", Arguments::Required),
    ("nth-of-type", Arguments::Required),
    ("nth-child", Arguments::Required),
    ("first-of-type", Arguments::None),
    ("last-of-type", Arguments::None),
    ("only-of-type", Arguments::None),
    ("first-child", Arguments::None),
    ("last-child", Arguments::None),
    ("only-child", Arguments::None),
    ("out-of-range", Arguments::None),
    ("indeterminate", Arguments::None),
    ("fullscreen", Arguments::None),
    ("read-write", Arguments::None),
    ("read-only", Arguments::None),
    ("in-range", Arguments::None),
    ("checked", Arguments::None),
    ("default", Arguments::None),
    ("disabled", Arguments::None),
    ("enabled", Arguments::None),
    ("invalid", Arguments::None),
    ("optional", Arguments::None),
    ("required", Arguments::None),
    ("visited", Arguments::None),
    ("active", Arguments::None),
    ("target", Arguments::None),
    ("empty", Arguments::None),
    ("first", Arguments::None),
    ("focus", Arguments::None),
    ("hover", Arguments::None),
    ("right", Arguments::None),
    ("scope", Arguments::None),
    ("valid", Arguments::None),
    ("left", Arguments::None),
    ("link", Arguments::None),
    ("root", Arguments::None),
    ("lang", Arguments::Required),
    ("dir", Arguments::Required),
    ("not", Arguments::Required),
];

/// [§ 3.6.2 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
///
/// Pseudo-elements, accepted with one or two leading colons.
const PSEUDO_ELEMENTS: &[&str] = &["first-letter", "first-line", "selection", "before", "after"];

/// Pseudo-selectors that depend on user interaction or generated content.
///
/// A static document cannot honour them, so rules using them are skipped
/// rather than applied unconditionally.
const UNSUPPORTED_PSEUDO_SELECTORS: &[&str] = &[
    "link",
    "hover",
    "active",
    "focus",
    "visited",
    "target",
    "first-letter",
    "first-line",
    "before",
    "after",
];

/// Whether the selector contains a pseudo-class from the specificity table.
#[must_use]
pub fn is_pseudo_class(selector: &str) -> bool {
    any_match(selector, match_pseudo_class)
}

/// Whether the selector contains a pseudo-element.
#[must_use]
pub fn is_pseudo_element(selector: &str) -> bool {
    any_match(selector, match_pseudo_element)
}

/// Whether a rule with this selector can be inlined.
///
/// Returns `false` when the selector uses any of the interactive or
/// generated-content pseudo-selectors (`:hover`, `::before`, ...). Those
/// rules are skipped silently; they are not errors.
#[must_use]
pub fn is_supported_selector(selector: &str) -> bool {
    !UNSUPPORTED_PSEUDO_SELECTORS
        .iter()
        .any(|name| contains_pseudo(selector, name))
}

/// Whether `:name` or `::name` occurs in the selector as a whole name.
fn contains_pseudo(selector: &str, name: &str) -> bool {
    selector
        .bytes()
        .enumerate()
        .filter(|&(_, byte)| byte == b':')
        .any(|(i, _)| {
            let name_end = i + 1 + name.len();
            selector
                .get(i + 1..name_end)
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
                && !selector[name_end..].chars().next().is_some_and(is_ident_char)
        })
}

fn any_match(selector: &str, matcher: fn(&str, usize) -> Option<usize>) -> bool {
    selector
        .char_indices()
        .any(|(i, _)| matcher(selector, i).is_some())
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// `[` up to the matching `]`, skipping brackets inside quoted values. An
/// unterminated attribute selector runs to the end of the text.
pub(crate) fn match_attribute(selector: &str, start: usize) -> Option<usize> {
    let bytes = selector.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }

    let mut quote: Option<u8> = None;
    let mut i = start + 1;
    while i < bytes.len() {
        match (quote, bytes[i]) {
            (Some(_), b'\\') => i += 1,
            (Some(q), byte) if byte == q => quote = None,
            (None, byte @ (b'"' | b'\'')) => quote = Some(byte),
            (None, b']') => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    Some(bytes.len())
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
///
/// A single `:` followed by a name from [`PSEUDO_CLASSES`]. Functional
/// pseudo-classes extend to their closing parenthesis; the others must end
/// at an identifier boundary.
pub(crate) fn match_pseudo_class(selector: &str, start: usize) -> Option<usize> {
    let bytes = selector.as_bytes();
    if bytes.get(start) != Some(&b':')
        || bytes.get(start + 1) == Some(&b':')
        || (start > 0 && bytes[start - 1] == b':')
    {
        return None;
    }

    let name_start = start + 1;
    PSEUDO_CLASSES.iter().find_map(|&(name, arguments)| {
        let after = name_start + name.len();
        if !selector
            .get(name_start..after)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
        {
            return None;
        }
        let next = selector[after..].chars().next();
        match arguments {
            Arguments::Required if next == Some('(') => {
                Some((matching_paren(selector, after + 1) + 1).min(selector.len()))
            }
            Arguments::None if !next.is_some_and(|c| c == '(' || is_ident_char(c)) => Some(after),
            _ => None,
        }
    })
}

/// [§ 3.6.2 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
///
/// One or two colons followed by a name from [`PSEUDO_ELEMENTS`].
pub(crate) fn match_pseudo_element(selector: &str, start: usize) -> Option<usize> {
    let bytes = selector.as_bytes();
    if bytes.get(start) != Some(&b':') || (start > 0 && bytes[start - 1] == b':') {
        return None;
    }

    let name_start = if bytes.get(start + 1) == Some(&b':') {
        start + 2
    } else {
        start + 1
    };
    PSEUDO_ELEMENTS.iter().find_map(|name| {
        let after = name_start + name.len();
        let is_name = selector
            .get(name_start..after)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name));
        (is_name && !selector[after..].chars().next().is_some_and(is_ident_char)).then_some(after)
    })
}

/// Index of the `)` closing the group opened just before `from`, or the end
/// of the text when it is never closed.
pub(crate) fn matching_paren(text: &str, from: usize) -> usize {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate().skip(from) {
        match byte {
            b'(' => depth += 1,
            b')' if depth == 0 => return i,
            b')' => depth -= 1,
            _ => {}
        }
    }
    text.len()
}

/// Advance over identifier code points starting at `start`.
pub(crate) fn skip_ident(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(text.len(), |(offset, _)| start + offset)
}

/// Check if a character can start an identifier.
/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
pub(crate) const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// Check if a character can continue an identifier.
/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
pub(crate) const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}
