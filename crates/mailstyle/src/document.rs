//! Collaborator interfaces: the HTML document and the selector engine.
//!
//! The inliner does not parse HTML or execute selectors itself. A caller
//! plugs in a [`Dom`] (usually a thin wrapper around an HTML parser) and a
//! [`SelectorEngine`] that can query it.

use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// [WHATWG HTML § 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
///
/// Characters written back as named references when
/// [`SerializeOptions::preserve_entities`] is set. Some mail clients garble
/// the raw characters.
pub const PRESERVED_ENTITIES: &[(char, &str)] = &[
    ('©', "&copy;"),
    ('®', "&reg;"),
    ('™', "&trade;"),
    ('£', "&pound;"),
    ('€', "&euro;"),
    ('¥', "&yen;"),
    ('§', "&sect;"),
    ('±', "&plusmn;"),
    ('¼', "&frac14;"),
    ('½', "&frac12;"),
    ('¾', "&frac34;"),
];

/// How a [`Dom`] writes itself back to HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Write void elements as `<br />` instead of `<br>`.
    pub self_closing: bool,
    /// Write the [`PRESERVED_ENTITIES`] characters as named references.
    pub preserve_entities: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            self_closing: false,
            preserve_entities: true,
        }
    }
}

/// Replace every [`PRESERVED_ENTITIES`] character in `text` with its named
/// reference. Borrows when there is nothing to replace.
///
/// ```
/// use mailstyle::document::encode_preserved_entities;
///
/// assert_eq!(encode_preserved_entities("© 2024 ½ off"), "&copy; 2024 &frac12; off");
/// assert_eq!(encode_preserved_entities("plain"), "plain");
/// ```
#[must_use]
pub fn encode_preserved_entities(text: &str) -> Cow<'_, str> {
    let entity = |c: char| {
        PRESERVED_ENTITIES
            .iter()
            .find(|&&(character, _)| character == c)
            .map(|&(_, name)| name)
    };
    if !text.chars().any(|c| entity(c).is_some()) {
        return Cow::Borrowed(text);
    }

    let mut encoded = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match entity(c) {
            Some(name) => encoded.push_str(name),
            None => encoded.push(c),
        }
    }
    Cow::Owned(encoded)
}

/// [DOM Living Standard § 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// The subset of a document tree the inliner reads and edits.
pub trait Dom {
    /// A handle to one node, stable for the lifetime of the document.
    type Node: Copy + Eq + Hash + Debug;

    /// Every `<style>` and `<link>` element, in document order.
    fn stylesheet_elements(&self) -> Vec<Self::Node>;

    /// Every element, in document order.
    fn elements(&self) -> Vec<Self::Node>;

    /// The element's local name.
    fn tag_name(&self, node: Self::Node) -> &str;

    /// An attribute value; `Some("")` for a present but empty attribute.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Set or replace an attribute.
    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    /// Remove an attribute if present.
    fn remove_attribute(&mut self, node: Self::Node, name: &str);

    /// The content of the node's first text child, unserialized.
    fn first_text(&self, node: Self::Node) -> Option<&str>;

    /// Detach a node and its subtree from the document.
    fn remove(&mut self, node: Self::Node);

    /// Remove every comment node.
    fn remove_comments(&mut self);

    /// Append a `<style>` element holding `css` to the document head (or the
    /// document itself when there is no head).
    fn append_style(&mut self, css: &str);

    /// Serialize the document back to HTML.
    fn serialize(&self, options: &SerializeOptions) -> String;
}

/// Construct a [`Dom`] from HTML text.
///
/// HTML parsing recovers from every error, so construction cannot fail.
pub trait ParseHtml: Dom + Sized {
    /// Parse a complete document.
    fn parse_html(html: &str) -> Self;
}

/// A selector the engine could not evaluate.
#[derive(Debug, Clone, Error)]
#[error("cannot evaluate selector '{selector}': {reason}")]
pub struct SelectorError {
    /// The selector text.
    pub selector: String,
    /// Why it was rejected.
    pub reason: String,
}

impl SelectorError {
    /// Create an error for `selector`.
    #[must_use]
    pub fn new(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// [Selectors Level 4 § 3.1 Selector matching](https://www.w3.org/TR/selectors-4/#match-against-element)
///
/// Finds the elements of a document that a selector matches.
pub trait SelectorEngine<D: Dom> {
    /// Every element of `dom` matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the selector is malformed or uses
    /// syntax the engine does not support. The inliner skips such rules.
    fn select(&self, dom: &D, selector: &str) -> Result<Vec<D::Node>, SelectorError>;
}
