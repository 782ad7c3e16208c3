//! Inline stylesheet rules into `style` attributes for HTML email.
//!
//! Mail clients drop `<style>` elements and ignore linked stylesheets, so
//! every rule has to be written onto the elements it matches. This crate
//! drives that process on top of [`mailstyle_css`]: it gathers the
//! document's stylesheets (inline, linked and imported), resolves the
//! cascade for every element and writes the result back, including the
//! legacy attributes older clients still read.
//!
//! HTML parsing and selector matching are supplied by the caller through
//! the [`Dom`] and [`SelectorEngine`] traits.
//!
//! ```ignore
//! let inliner = Inliner::with_http(MySelectorEngine)?;
//! let result = inliner.inline_html::<MyDom>(html, &InlineOptions::default())?;
//! ```

/// Document and selector-engine interfaces.
pub mod document;
/// Error types.
pub mod error;
/// The inlining pipeline.
pub mod inliner;
/// Run configuration.
pub mod options;

pub use document::{Dom, ParseHtml, SelectorEngine, SelectorError, SerializeOptions};
pub use error::InlineError;
pub use inliner::{InlineResult, Inliner};
pub use options::InlineOptions;
