//! Per-element style resolution.
//!
//! [§ 6.4 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)

use crate::cascade::CascadeStore;
use crate::parser::{RuleSet, parse_inline_style};

/// Resolve the final declarations for one element.
///
/// `rules` are the rules whose selector matched the element, in any order;
/// `inline_style` is the element's existing `style` attribute.
///
/// STEP 1: Sort the rules ascending by (specificity, position), so of two
/// equally specific rules the later-declared one is applied last.
///
/// STEP 2: Merge each rule's declarations with overwrite. `!important`
/// declarations are never replaced by normal ones.
///
/// STEP 3: Merge the inline declarations last with overwrite. Inline style
/// wins against every normal rule declaration but not against an important
/// one it does not itself mark important.
#[must_use]
pub fn resolve_style<'a>(
    rules: impl IntoIterator<Item = &'a RuleSet>,
    inline_style: Option<&str>,
) -> CascadeStore {
    // STEP 1
    let mut matched: Vec<&RuleSet> = rules.into_iter().collect();
    matched.sort_by_key(|rule| (rule.specificity(), rule.position()));

    // STEP 2
    let mut resolved = CascadeStore::new();
    for rule in matched {
        resolved.merge(rule.declarations(), true);
    }

    // STEP 3
    if let Some(inline_style) = inline_style {
        resolved.merge(&parse_inline_style(inline_style), true);
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RuleTable;

    fn table(css: &str) -> RuleTable {
        let mut table = RuleTable::new();
        table.parse(css);
        table
    }

    #[test]
    fn test_no_rules_no_inline() {
        assert!(resolve_style([], None).is_empty());
    }

    #[test]
    fn test_inline_only_is_normalized() {
        let resolved = resolve_style([], Some("color:red;;width : 1px"));
        assert_eq!(resolved.render(false), "color: red;width: 1px");
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let table = table(".a { color: red } .b { color: blue }");
        let a = table.get(".a").unwrap();
        let b = table.get(".b").unwrap();
        assert_eq!(resolve_style([a, b], None), resolve_style([b, a], None));
        assert_eq!(resolve_style([b, a], None).render(false), "color: blue");
    }

    #[test]
    fn test_important_rule_beats_inline() {
        let table = table("p { color: red !important; width: 1px }");
        let resolved = resolve_style(table.iter(), Some("color: blue; width: 2px"));
        assert_eq!(resolved.render(true), "color: red !important;width: 2px");
    }

    #[test]
    fn test_important_inline_beats_important_rule() {
        let table = table("p { color: red !important }");
        let resolved = resolve_style(table.iter(), Some("color: blue !important"));
        assert_eq!(resolved.get("color").unwrap().value(), "blue");
    }
}
