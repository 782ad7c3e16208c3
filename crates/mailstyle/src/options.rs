//! Inliner configuration.

use serde::{Deserialize, Serialize};

use crate::document::SerializeOptions;

/// Settings for one inlining run.
///
/// Loadable from any serde format; missing fields take their default.
///
/// ```
/// use mailstyle::InlineOptions;
///
/// let options = InlineOptions::default()
///     .with_base_url("https://example.com/newsletter/")
///     .with_remove_comments(true);
/// assert!(options.remove_style_elements);
/// assert_eq!(options.base_url.as_deref(), Some("https://example.com/newsletter/"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineOptions {
    /// Base URL for resolving relative stylesheet links and imports.
    pub base_url: Option<String>,
    /// Remove inlined `<style>` and stylesheet `<link>` elements (default: true).
    pub remove_style_elements: bool,
    /// Selector of elements that receive no styles.
    pub ignore_elements: Option<String>,
    /// Extra CSS applied after every stylesheet in the document.
    pub css: Option<String>,
    /// Remove `id` and `class` attributes once styles are inlined.
    pub strip_id_and_class: bool,
    /// Remove HTML comments.
    pub remove_comments: bool,
    /// Keep `@media` blocks that cannot be inlined in a new `<style>` element.
    pub preserve_media_queries: bool,
    /// Report stylesheet and import fetch failures as warnings instead of
    /// failing the run.
    pub stylesheet_fetch_warnings: bool,
    /// Keep `!important` in the written `style` attributes.
    pub emit_important: bool,
    /// Output settings passed to the document serializer.
    pub serialize: SerializeOptions,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            remove_style_elements: true,
            ignore_elements: None,
            css: None,
            strip_id_and_class: false,
            remove_comments: false,
            preserve_media_queries: false,
            stylesheet_fetch_warnings: false,
            emit_important: false,
            serialize: SerializeOptions::default(),
        }
    }
}

impl InlineOptions {
    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Keep or remove inlined stylesheet elements.
    #[must_use]
    pub const fn with_remove_style_elements(mut self, remove: bool) -> Self {
        self.remove_style_elements = remove;
        self
    }

    /// Set the selector of elements to leave unstyled.
    #[must_use]
    pub fn with_ignore_elements(mut self, selector: impl Into<String>) -> Self {
        self.ignore_elements = Some(selector.into());
        self
    }

    /// Set extra CSS to apply.
    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Strip `id` and `class` attributes after inlining.
    #[must_use]
    pub const fn with_strip_id_and_class(mut self, strip: bool) -> Self {
        self.strip_id_and_class = strip;
        self
    }

    /// Remove HTML comments.
    #[must_use]
    pub const fn with_remove_comments(mut self, remove: bool) -> Self {
        self.remove_comments = remove;
        self
    }

    /// Keep unsupported `@media` blocks in the output.
    #[must_use]
    pub const fn with_preserve_media_queries(mut self, preserve: bool) -> Self {
        self.preserve_media_queries = preserve;
        self
    }

    /// Downgrade fetch failures to warnings.
    #[must_use]
    pub const fn with_stylesheet_fetch_warnings(mut self, warn: bool) -> Self {
        self.stylesheet_fetch_warnings = warn;
        self
    }

    /// Keep `!important` in written styles.
    #[must_use]
    pub const fn with_emit_important(mut self, emit: bool) -> Self {
        self.emit_important = emit;
        self
    }

    /// Set the serializer options.
    #[must_use]
    pub const fn with_serialize(mut self, serialize: SerializeOptions) -> Self {
        self.serialize = serialize;
        self
    }
}
