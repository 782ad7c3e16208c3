//! CSS Cascading and declaration storage
//!
//! This module implements the subset of
//! [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)
//! an inliner needs: an ordered, case-insensitive declaration store and the
//! merge rule that combines two of them.

pub mod resolver;

use std::collections::HashMap;
use std::fmt;

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// One `property: value` pair with its `!important` annotation.
///
/// The property name is compared case-insensitively but keeps its original
/// spelling for output; the value is stored exactly as written (trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    property: String,
    value: String,
    important: bool,
}

impl Declaration {
    /// Create a declaration from already separated parts.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }

    /// Parse one `property: value[ !important]` segment.
    ///
    /// Splits on the first `:` only, so values such as
    /// `url('http://example.com/a.png')` survive intact. Returns `None` for
    /// blank segments and for segments missing a property or a value.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        let (property, value) = segment.trim().split_once(':')?;
        let property = property.trim();
        if property.is_empty() {
            return None;
        }

        let (value, important) = strip_important(value.trim());
        if value.is_empty() {
            return None;
        }

        Some(Self::new(property, value, important))
    }

    /// The property name as written.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// The value, without any `!important` marker.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the declaration carried `!important`.
    #[must_use]
    pub const fn is_important(&self) -> bool {
        self.important
    }

    /// Render as `property: value`, suffixed with ` !important` only when
    /// `emit_important` is set and the declaration is important.
    #[must_use]
    pub fn render(&self, emit_important: bool) -> String {
        if emit_important && self.important {
            format!("{}: {} !important", self.property, self.value)
        } else {
            format!("{}: {}", self.property, self.value)
        }
    }

    /// Lookup key: the ASCII-lowercased property name.
    fn key(&self) -> String {
        property_key(&self.property)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

/// [§ 6.4.2](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation"
///
/// Returns the value with the annotation removed. Whitespace between `!` and
/// `important` is tolerated.
fn strip_important(value: &str) -> (&str, bool) {
    const IMPORTANT: &str = "important";

    let Some(split) = value.len().checked_sub(IMPORTANT.len()) else {
        return (value, false);
    };
    let Some(tail) = value.get(split..) else {
        return (value, false);
    };
    if !tail.eq_ignore_ascii_case(IMPORTANT) {
        return (value, false);
    }

    let rest = value[..split].trim_end();
    rest.strip_suffix('!')
        .map_or((value, false), |stripped| (stripped.trim_end(), true))
}

fn property_key(property: &str) -> String {
    property.trim().to_ascii_lowercase()
}

/// An ordered collection of declarations keyed by property name.
///
/// Storage is an append-only slot list plus a name-to-slot index. Iteration
/// always follows slot order, which is cascade order:
///
/// - [`CascadeStore::set`] keeps an existing property in its slot, so
///   first-seen order is stable across overwrites.
/// - [`CascadeStore::merge_declaration`] moves the property to a fresh slot
///   at the end, marking it as the most recently decided.
#[derive(Debug, Clone, Default)]
pub struct CascadeStore {
    slots: Vec<Option<Declaration>>,
    index: HashMap<String, usize>,
}

impl CascadeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional set: insert at the next position, or replace an existing
    /// property's value while keeping its position.
    pub fn set(&mut self, declaration: Declaration) {
        let key = declaration.key();
        if let Some(&slot) = self.index.get(&key) {
            self.slots[slot] = Some(declaration);
        } else {
            let _ = self.index.insert(key, self.slots.len());
            self.slots.push(Some(declaration));
        }
    }

    /// Merge set: insert or replace, always assigning the next position.
    pub fn merge_declaration(&mut self, declaration: Declaration) {
        let key = declaration.key();
        if let Some(slot) = self.index.remove(&key) {
            self.slots[slot] = None;
        }
        let _ = self.index.insert(key, self.slots.len());
        self.slots.push(Some(declaration));
        self.compact_if_sparse();
    }

    /// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
    ///
    /// Merge every declaration of `donor` into this store.
    ///
    /// A missing property is always added. An existing one is replaced only
    /// when `can_overwrite` is set, and never when the existing declaration
    /// is important and the donor's is not. Replaced and added properties
    /// take the next position, in donor order.
    pub fn merge(&mut self, donor: &Self, can_overwrite: bool) {
        for declaration in donor.iter() {
            let replace = match self.get(declaration.property()) {
                None => true,
                Some(existing) => {
                    can_overwrite && (!existing.is_important() || declaration.is_important())
                }
            };
            if replace {
                self.merge_declaration(declaration.clone());
            }
        }
    }

    /// Look up a property, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        let slot = *self.index.get(&property_key(property))?;
        self.slots[slot].as_ref()
    }

    /// Whether the property is present, ignoring ASCII case.
    #[must_use]
    pub fn contains(&self, property: &str) -> bool {
        self.index.contains_key(&property_key(property))
    }

    /// Remove a property, returning its declaration.
    pub fn remove(&mut self, property: &str) -> Option<Declaration> {
        let slot = self.index.remove(&property_key(property))?;
        self.slots[slot].take()
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no property.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterate over declarations in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.slots.iter().flatten()
    }

    /// Render as `property: value` pairs joined by `;`, in position order.
    #[must_use]
    pub fn render(&self, emit_important: bool) -> String {
        self.iter()
            .map(|declaration| declaration.render(emit_important))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Drop vacated slots once they outnumber the live ones.
    fn compact_if_sparse(&mut self) {
        if self.slots.len() <= 2 * self.index.len() + 8 {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (slot, declaration) in self.slots.iter().enumerate() {
            if let Some(declaration) = declaration {
                let _ = self.index.insert(declaration.key(), slot);
            }
        }
    }
}

impl PartialEq for CascadeStore {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for CascadeStore {}

impl FromIterator<Declaration> for CascadeStore {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        let mut store = Self::new();
        for declaration in iter {
            store.set(declaration);
        }
        store
    }
}

impl fmt::Display for CascadeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(declarations: &[(&str, &str, bool)]) -> CascadeStore {
        declarations
            .iter()
            .map(|&(property, value, important)| Declaration::new(property, value, important))
            .collect()
    }

    #[test]
    fn test_parse_declaration() {
        let declaration = Declaration::parse(" color : Red ").unwrap();
        assert_eq!(declaration.property(), "color");
        assert_eq!(declaration.value(), "Red");
        assert!(!declaration.is_important());
    }

    #[test]
    fn test_parse_splits_on_first_colon_only() {
        let declaration =
            Declaration::parse("background: url('http://example.com/a.png')").unwrap();
        assert_eq!(declaration.value(), "url('http://example.com/a.png')");
    }

    #[test]
    fn test_parse_important_variants() {
        for segment in [
            "width: 1px !important",
            "width: 1px!important",
            "width: 1px ! important",
            "width: 1px !IMPORTANT",
        ] {
            let declaration = Declaration::parse(segment).unwrap();
            assert_eq!(declaration.value(), "1px", "{segment}");
            assert!(declaration.is_important(), "{segment}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_segments() {
        assert!(Declaration::parse("").is_none());
        assert!(Declaration::parse("   ").is_none());
        assert!(Declaration::parse("color").is_none());
        assert!(Declaration::parse(": red").is_none());
        assert!(Declaration::parse("color:").is_none());
    }

    #[test]
    fn test_value_ending_in_important_word_is_not_important() {
        let declaration = Declaration::parse("content: important").unwrap();
        assert_eq!(declaration.value(), "important");
        assert!(!declaration.is_important());
    }

    #[test]
    fn test_set_keeps_position() {
        let mut store = store(&[("color", "red", false), ("width", "1px", false)]);
        store.set(Declaration::new("COLOR", "blue", false));
        assert_eq!(store.render(false), "COLOR: blue;width: 1px");
    }

    #[test]
    fn test_merge_declaration_moves_to_end() {
        let mut store = store(&[("color", "red", false), ("width", "1px", false)]);
        store.merge_declaration(Declaration::new("color", "blue", false));
        assert_eq!(store.render(false), "width: 1px;color: blue");
    }

    #[test]
    fn test_merge_without_overwrite_only_adds() {
        let mut target = store(&[("color", "red", false)]);
        target.merge(&store(&[("color", "blue", false), ("height", "2px", false)]), false);
        assert_eq!(target.render(false), "color: red;height: 2px");
    }

    #[test]
    fn test_important_is_not_downgraded() {
        let mut target = store(&[("color", "red", true)]);
        target.merge(&store(&[("color", "blue", false)]), true);
        assert_eq!(target.get("color").unwrap().value(), "red");

        target.merge(&store(&[("color", "green", true)]), true);
        assert_eq!(target.get("color").unwrap().value(), "green");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let donor = store(&[("width", "1px", false), ("color", "red", true)]);
        let mut once = store(&[("color", "blue", false), ("margin", "0", false)]);
        once.merge(&donor, true);
        let mut twice = once.clone();
        twice.merge(&donor, true);
        assert_eq!(once, twice);
        assert_eq!(twice.render(true), "margin: 0;width: 1px;color: red !important");
    }

    #[test]
    fn test_remove_and_lookup_are_case_insensitive() {
        let mut store = store(&[("Background-Color", "#fff", false)]);
        assert!(store.contains("background-color"));
        let removed = store.remove("BACKGROUND-COLOR").unwrap();
        assert_eq!(removed.property(), "Background-Color");
        assert!(store.is_empty());
        assert_eq!(store.render(false), "");
    }

    #[test]
    fn test_compaction_preserves_order() {
        let mut store = CascadeStore::new();
        for round in 0..20 {
            store.merge_declaration(Declaration::new("a", round.to_string(), false));
            store.merge_declaration(Declaration::new("b", round.to_string(), false));
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.render(false), "a: 19;b: 19");
    }

    #[test]
    fn test_render_modes() {
        let store = store(&[("color", "red", true), ("width", "1px", false)]);
        assert_eq!(store.render(false), "color: red;width: 1px");
        assert_eq!(store.render(true), "color: red !important;width: 1px");
        assert_eq!(store.to_string(), "color: red;width: 1px");
    }
}
