//! Text-level specificity scoring.
//!
//! The selector is never parsed into a tree. Each component category is a
//! matcher over the raw text; categories are counted and cut out of the
//! selector in a fixed order so later matchers never see text an earlier one
//! already claimed.

use std::fmt;
use std::ops::{Add, AddAssign};

use super::{
    is_ident_char, is_ident_start_char, match_attribute, match_pseudo_class,
    match_pseudo_element, matching_paren, skip_ident,
};

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
/// "A selector's specificity is calculated for a given element as follows:
///  - count the number of ID selectors in the selector (= A)
///  - count the number of class selectors, attributes selectors, and pseudo-classes in the selector (= B)
///  - count the number of type selectors and pseudo-elements in the selector (= C)
///
/// Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Specificity of the universal selector.
    pub const ZERO: Self = Self(0, 0, 0);

    /// Create a new specificity value.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }

    /// Number of ID selectors (A).
    #[must_use]
    pub const fn ids(self) -> u32 {
        self.0
    }

    /// Number of class, attribute and pseudo-class selectors (B).
    #[must_use]
    pub const fn classes(self) -> u32 {
        self.1
    }

    /// Number of type selectors and pseudo-elements (C).
    #[must_use]
    pub const fn elements(self) -> u32 {
        self.2
    }
}

impl Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

impl AddAssign for Specificity {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.0, self.1, self.2)
    }
}

/// A matcher returns the end of the component starting at `start`, if any.
type Matcher = fn(&str, usize) -> Option<usize>;

/// [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules)
///
/// Score a selector.
///
/// Empty input and the universal selector `*` score zero. A `:not(...)` is
/// cut out of the selector and its argument is scored recursively and added;
/// the `:not` itself counts for nothing. The rest is counted in the order
/// IDs, attributes, classes, pseudo-classes, type selectors, pseudo-elements.
///
/// ```
/// use mailstyle_css::selector::{Specificity, specificity};
///
/// assert_eq!(specificity("LI.red.level"), Specificity(0, 2, 1));
/// assert_eq!(specificity("#id:not(FOO-BAR)"), Specificity(1, 0, 1));
/// ```
#[must_use]
pub fn specificity(selector: &str) -> Specificity {
    let selector = selector.trim();
    if selector.is_empty() || selector == "*" {
        return Specificity::ZERO;
    }

    let (remaining, mut result) = strip_negations(selector);

    let (remaining, ids) = count_and_strip(&remaining, match_id);
    let (remaining, attributes) = count_and_strip(&remaining, match_attribute);
    let (remaining, classes) = count_and_strip(&remaining, match_class);
    let (remaining, pseudo_classes) = count_and_strip(&remaining, match_pseudo_class);
    let (remaining, elements) = count_and_strip(&remaining, match_element);
    let (_, pseudo_elements) = count_and_strip(&remaining, match_pseudo_element);

    result += Specificity(
        ids,
        attributes + classes + pseudo_classes,
        elements + pseudo_elements,
    );
    result
}

/// Cut every `:not(...)` out of `selector`, returning the remaining text and
/// the summed specificity of the arguments.
fn strip_negations(selector: &str) -> (String, Specificity) {
    let mut remaining = String::with_capacity(selector.len());
    let mut total = Specificity::ZERO;
    let mut rest = selector;

    while let Some(start) = find_ignore_ascii_case(rest, ":not(") {
        remaining.push_str(&rest[..start]);
        let argument_start = start + ":not(".len();
        let argument_end = matching_paren(rest, argument_start);
        total += specificity(&rest[argument_start..argument_end]);
        rest = rest.get(argument_end + 1..).unwrap_or("");
    }

    remaining.push_str(rest);
    (remaining, total)
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Remove every match of `matcher` from `selector`, counting them.
fn count_and_strip(selector: &str, matcher: Matcher) -> (String, u32) {
    let mut remaining = String::with_capacity(selector.len());
    let mut count = 0;
    let mut i = 0;

    while i < selector.len() {
        if let Some(end) = matcher(selector, i) {
            count += 1;
            i = end;
            continue;
        }
        let Some(ch) = selector[i..].chars().next() else {
            break;
        };
        remaining.push(ch);
        i += ch.len_utf8();
    }

    (remaining, count)
}

/// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
///
/// `#` followed by at least one identifier code point.
fn match_id(selector: &str, start: usize) -> Option<usize> {
    match_prefixed_ident(selector, start, b'#')
}

/// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
///
/// `.` followed by at least one identifier code point.
fn match_class(selector: &str, start: usize) -> Option<usize> {
    match_prefixed_ident(selector, start, b'.')
}

fn match_prefixed_ident(selector: &str, start: usize, prefix: u8) -> Option<usize> {
    if selector.as_bytes().get(start) != Some(&prefix) {
        return None;
    }
    let end = skip_ident(selector, start + 1);
    (end > start + 1).then_some(end)
}

/// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
///
/// A bare identifier that is not the tail of another token (a pseudo name
/// after `:`, or the rest of an identifier).
fn match_element(selector: &str, start: usize) -> Option<usize> {
    let first = selector[start..].chars().next()?;
    if !is_ident_start_char(first) {
        return None;
    }
    let continues_token = selector[..start]
        .chars()
        .next_back()
        .is_some_and(|previous| previous == ':' || previous == '\\' || is_ident_char(previous));
    if continues_token {
        return None;
    }
    Some(skip_ident(selector, start))
}
