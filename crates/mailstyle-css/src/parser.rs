//! Rule parsing for cleaned stylesheets.
//!
//! The inliner does not need a full CSS object model. A cleaned stylesheet
//! (see [`crate::cleaner`]) is a flat run of `selectors { declarations }`
//! blocks, which this module splits with plain text scanning into a
//! [`RuleTable`] of [`RuleSet`]s keyed by selector.

use std::collections::HashMap;

use tracing::debug;

use crate::cascade::{CascadeStore, Declaration};
use crate::selector::{Specificity, specificity};

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-a-qualified-rule)
///
/// All declarations contributed by one selector, across every block that
/// named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    selector: String,
    specificity: Specificity,
    declarations: CascadeStore,
    position: usize,
}

impl RuleSet {
    /// Create an empty rule for `selector` at `position`.
    #[must_use]
    pub fn new(selector: impl Into<String>, position: usize) -> Self {
        let selector = selector.into();
        Self {
            specificity: specificity(&selector),
            selector,
            declarations: CascadeStore::new(),
            position,
        }
    }

    /// The selector text, exactly as it appeared (trimmed).
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The selector's specificity.
    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// The merged declarations of every block naming this selector.
    #[must_use]
    pub const fn declarations(&self) -> &CascadeStore {
        &self.declarations
    }

    /// Source-order tie-break: the position of the latest block that named
    /// this selector.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}

/// [§ 6.4 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// "The last declaration in document order wins."
///
/// Every rule parsed during one inlining run. Positions come from a single
/// counter owned by the table, so rules parsed from separate `<style>`
/// elements, linked files and imports share one source order.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<RuleSet>,
    index: HashMap<String, usize>,
    next_position: usize,
}

impl RuleTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cleaned stylesheet, accumulating its rules into this table.
    pub fn parse(&mut self, cleaned: &str) {
        let before = self.next_position;
        for fragment in cleaned.split('}') {
            let Some((selectors, body)) = fragment.split_once('{') else {
                continue;
            };
            let declarations = parse_declarations(body);
            for selector in split_selectors(selectors) {
                self.upsert(selector, &declarations);
            }
        }
        debug!(
            rules = self.rules.len(),
            parsed = self.next_position - before,
            "parsed stylesheet"
        );
    }

    /// Look up a rule by its exact selector text.
    #[must_use]
    pub fn get(&self, selector: &str) -> Option<&RuleSet> {
        self.index.get(selector).map(|&i| &self.rules[i])
    }

    /// Number of distinct selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule has been parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules in position order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        let mut rules: Vec<&RuleSet> = self.rules.iter().collect();
        rules.sort_by_key(|rule| rule.position);
        rules.into_iter()
    }

    /// Merge one block's declarations into the rule for `selector` and
    /// refresh its position.
    fn upsert(&mut self, selector: &str, declarations: &[Declaration]) {
        let position = self.next_position;
        self.next_position += 1;

        let slot = if let Some(&slot) = self.index.get(selector) {
            slot
        } else {
            let _ = self.index.insert(selector.to_string(), self.rules.len());
            self.rules.push(RuleSet::new(selector, position));
            self.rules.len() - 1
        };

        let rule = &mut self.rules[slot];
        for declaration in declarations {
            rule.declarations.set(declaration.clone());
        }
        rule.position = position;
    }
}

/// Split a selector group on top-level commas.
///
/// Commas inside brackets, parentheses or quotes (`[title="a,b"]`,
/// `:is(p, li)`) do not split. Empty selectors and at-rule remnants are
/// dropped.
fn split_selectors(group: &str) -> Vec<&str> {
    split_top_level(group, b',')
        .into_iter()
        .map(str::trim)
        .filter(|selector| !selector.is_empty() && !selector.starts_with('@'))
        .collect()
}

/// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
///
/// Parse a declaration body into declarations, in source order.
///
/// The body is split on `;` except inside quotes or parentheses, so
/// `content: "a;b"` and unquoted `url(data:image/png;base64,...)` stay whole.
/// Segments that are blank or malformed are skipped.
#[must_use]
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    split_top_level(body, b';')
        .into_iter()
        .filter_map(Declaration::parse)
        .collect()
}

/// Parse a `style` attribute value into a store.
///
/// Re-declaring a property keeps its first position and the last value.
#[must_use]
pub fn parse_inline_style(style: &str) -> CascadeStore {
    parse_declarations(style).into_iter().collect()
}

/// Split on `separator` where it is outside quotes, brackets and parentheses.
fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if let Some(q) = quote {
            if byte == b'\\' {
                i += 1;
            } else if byte == q {
                quote = None;
            }
        } else {
            match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'\\' => i += 1,
                _ if byte == separator && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }

    parts.push(&text[start..]);
    parts
}
