//! Property tests for specificity scoring and cascade merging.
#![allow(clippy::needless_pass_by_value)]

use mailstyle_css::selector::{Specificity, specificity};
use mailstyle_css::{CascadeStore, Declaration};
use quickcheck_macros::quickcheck;

const PROPERTIES: &[&str] = &["color", "width", "margin", "background-color", "border"];
const VALUES: &[&str] = &["red", "0", "10px", "#f1f1f1", "none", "auto"];

/// Build a store from generated `(property, value, important)` picks.
fn store(picks: &[(u8, u8, bool)]) -> CascadeStore {
    let mut store = CascadeStore::new();
    for &(property, value, important) in picks {
        store.set(Declaration::new(
            PROPERTIES[usize::from(property) % PROPERTIES.len()],
            VALUES[usize::from(value) % VALUES.len()],
            important,
        ));
    }
    store
}

/// Simple selectors of the middle specificity column, from generated picks.
fn components(picks: &[u8]) -> Vec<String> {
    picks
        .iter()
        .enumerate()
        .map(|(i, &pick)| match pick % 3 {
            0 => format!(".c{i}"),
            1 => format!("[data-a{i}]"),
            _ => ":first-child".to_string(),
        })
        .collect()
}

#[quickcheck]
fn prop_merge_is_idempotent(target: Vec<(u8, u8, bool)>, donor: Vec<(u8, u8, bool)>) -> bool {
    let donor = store(&donor);

    let mut once = store(&target);
    once.merge(&donor, true);

    let mut twice = once.clone();
    twice.merge(&donor, true);

    once == twice && once.render(true) == twice.render(true)
}

#[quickcheck]
fn prop_important_is_never_downgraded(target: Vec<(u8, u8, bool)>, value: u8) -> bool {
    let mut target = store(&target);
    target.set(Declaration::new("color", "important-red", true));

    let mut donor = CascadeStore::new();
    donor.set(Declaration::new(
        "COLOR",
        VALUES[usize::from(value) % VALUES.len()],
        false,
    ));
    target.merge(&donor, true);

    target
        .get("color")
        .is_some_and(|declaration| declaration.value() == "important-red")
}

#[quickcheck]
fn prop_merge_without_overwrite_only_adds(
    target: Vec<(u8, u8, bool)>,
    donor: Vec<(u8, u8, bool)>,
) -> bool {
    let before = store(&target);
    let donor = store(&donor);

    let mut after = before.clone();
    after.merge(&donor, false);

    before
        .iter()
        .all(|declaration| after.get(declaration.property()) == Some(declaration))
        && donor.iter().all(|declaration| after.contains(declaration.property()))
}

#[quickcheck]
fn prop_simple_selector_order_is_irrelevant(picks: Vec<u8>) -> bool {
    let parts = components(&picks);
    let forward = format!("div{}", parts.concat());
    let backward = format!(
        "div{}",
        parts.iter().rev().map(String::as_str).collect::<String>()
    );

    let Ok(count) = u32::try_from(parts.len()) else {
        return true;
    };
    let expected = Specificity(0, count, 1);
    specificity(&forward) == expected && specificity(&backward) == expected
}

#[quickcheck]
fn prop_ids_outrank_any_number_of_classes(classes: u8) -> bool {
    let many_classes: String = (0..classes).map(|i| format!(".c{i}")).collect();
    specificity("#a") > specificity(&format!("div{many_classes}"))
}
