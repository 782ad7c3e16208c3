//! Legacy presentational attributes.
//!
//! Many mail clients ignore CSS for a handful of layout properties but honour
//! the matching HTML 4 attributes. After an element's style is resolved this
//! module decides which attributes to write back:
//!
//! 1. Directive properties (`-premailer-cellspacing: 5`) become attributes
//!    (`cellspacing="5"`) and leave the style.
//! 2. The remaining declarations become the `style` attribute.
//! 3. `bgcolor`, `width` and `height` are refreshed from their CSS
//!    counterparts, but only on elements that already carry them.

use crate::cascade::CascadeStore;

/// Property prefix marking an inline-only directive that is emitted as an
/// HTML attribute instead of a style declaration.
///
/// This is the prefix existing email templates already use
/// (`-premailer-cellspacing: 0`). The stylesheet ignore marker in the
/// `mailstyle` crate uses the same name, `data-premailer="ignore"`.
pub const DIRECTIVE_PREFIX: &str = "-premailer-";

/// [HTML 4.01 § 15.1.1 Background color](https://www.w3.org/TR/html401/present/graphics.html#h-15.1.1)
///
/// Legacy attributes paired with the CSS property that replaced them.
pub const ATTRIBUTE_EQUIVALENTS: &[(&str, &str)] = &[
    ("bgcolor", "background-color"),
    ("width", "width"),
    ("height", "height"),
];

/// Elements whose `width`/`height` attributes must be unit-less.
const UNITLESS_DIMENSION_ELEMENTS: &[&str] = &["img"];

/// One attribute to set on the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeUpdate {
    /// Attribute name, lowercase.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

impl AttributeUpdate {
    /// Create an update.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Compute the attributes to set for an element with the resolved `style`.
///
/// `has_attribute` reports whether the element currently carries an
/// attribute (an empty value counts). `emit_important` keeps `!important`
/// in the rendered `style` value.
///
/// ```
/// use mailstyle_css::attributes::{AttributeUpdate, attribute_updates};
/// use mailstyle_css::parser::parse_inline_style;
///
/// let style = parse_inline_style("background-color: #f1f1f1");
/// let updates = attribute_updates(&style, "td", |name| name == "bgcolor", false);
/// assert_eq!(
///     updates,
///     [
///         AttributeUpdate::new("style", "background-color: #f1f1f1"),
///         AttributeUpdate::new("bgcolor", "#f1f1f1"),
///     ]
/// );
/// ```
#[must_use]
pub fn attribute_updates(
    style: &CascadeStore,
    tag_name: &str,
    has_attribute: impl Fn(&str) -> bool,
    emit_important: bool,
) -> Vec<AttributeUpdate> {
    let mut style = style.clone();
    let mut updates = Vec::new();

    // STEP 1: Directives leave the style and become attributes.
    let directives: Vec<String> = style
        .iter()
        .map(|declaration| declaration.property().to_string())
        .filter(|property| directive_attribute(property).is_some())
        .collect();
    for property in directives {
        let Some(declaration) = style.remove(&property) else {
            continue;
        };
        if let Some(name) = directive_attribute(&property) {
            updates.push(AttributeUpdate::new(name, declaration.value()));
        }
    }

    // STEP 2: Whatever is left is the style attribute.
    if !style.is_empty() {
        updates.push(AttributeUpdate::new("style", style.render(emit_important)));
    }

    // STEP 3: Refresh legacy attributes the markup already has.
    let unitless = UNITLESS_DIMENSION_ELEMENTS
        .iter()
        .any(|element| tag_name.eq_ignore_ascii_case(element));
    for &(attribute, property) in ATTRIBUTE_EQUIVALENTS {
        if !has_attribute(attribute) {
            continue;
        }
        let Some(declaration) = style.get(property) else {
            continue;
        };
        // STEP 4: Attribute-form dimensions on images carry no unit.
        let value = if unitless && attribute != "bgcolor" {
            strip_pixel_unit(declaration.value())
        } else {
            declaration.value()
        };
        updates.push(AttributeUpdate::new(attribute, value));
    }

    updates
}

/// The attribute name a directive property maps to, if it is one.
fn directive_attribute(property: &str) -> Option<String> {
    let prefix = property.get(..DIRECTIVE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(DIRECTIVE_PREFIX) {
        return None;
    }
    let name = &property[DIRECTIVE_PREFIX.len()..];
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

/// `120px` becomes `120`; anything that is not a plain pixel number is
/// returned unchanged.
fn strip_pixel_unit(value: &str) -> &str {
    let trimmed = value.trim();
    let number = trimmed
        .len()
        .checked_sub(2)
        .and_then(|split| trimmed.split_at_checked(split))
        .filter(|(_, unit)| unit.eq_ignore_ascii_case("px"))
        .map(|(number, _)| number.trim_end());

    match number {
        Some(number) if !number.is_empty() && number.parse::<f64>().is_ok() => number,
        _ => value,
    }
}
