//! Stylesheet cleaning, rule parsing, specificity and cascade resolution for
//! the mailstyle CSS inliner.
//!
//! # Scope
//!
//! This crate is the inliner's core. It never touches HTML; the caller
//! matches selectors against its document and feeds the matched rules back.
//!
//! - **Stylesheet Cleaner** ([`cleaner`])
//!   - Comment removal that leaves strings and `url(...)` intact
//!   - At-rule stripping, `@media` unwrapping for screen media
//!
//! - **Rule Parser** ([`parser`], [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - `selector { declarations }` blocks into a selector-keyed [`RuleTable`]
//!   - Global source positions shared across stylesheets
//!
//! - **Specificity** ([`selector`], [Selectors Level 4 § 17](https://www.w3.org/TR/selectors-4/#specificity-rules))
//!   - Text-level scoring, `:not(...)` argument scoring
//!   - Detection of selectors a static document cannot honour
//!
//! - **Cascade** ([`cascade`], [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/))
//!   - Ordered declaration store with `!important`-aware merging
//!   - Per-element resolution of matched rules plus inline style
//!
//! - **Imports** ([`import`])
//!   - `@import` flattening through a pluggable fetcher, depth-limited
//!
//! - **Attributes** ([`attributes`])
//!   - Directive properties and legacy `bgcolor`/`width`/`height` attributes

/// Legacy attribute mapping for resolved styles.
pub mod attributes;
/// Declaration storage and cascade merging per [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/).
pub mod cascade;
/// Stylesheet cleaning ahead of parsing.
pub mod cleaner;
/// Error types.
pub mod error;
/// `@import` resolution per [§ 2 Importing Style Sheets](https://www.w3.org/TR/css-cascade-4/#at-import).
pub mod import;
/// Rule parsing per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Selector specificity per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;

pub use attributes::{AttributeUpdate, attribute_updates};
pub use cascade::resolver::resolve_style;
pub use cascade::{CascadeStore, Declaration};
pub use cleaner::{CleanedStylesheet, clean, clean_with_media};
pub use error::ImportError;
pub use import::{ImportResolver, ImportedStylesheet};
pub use parser::{RuleSet, RuleTable, parse_inline_style};
pub use selector::{Specificity, is_supported_selector, specificity};
