//! The inlining pipeline.
//!
//! 1. Collect every stylesheet of the document in document order: `<style>`
//!    bodies and fetched `<link rel="stylesheet">` targets, each preceded by
//!    the stylesheets it `@import`s, then the caller's extra CSS.
//! 2. Clean and parse them into one [`RuleTable`].
//! 3. Match each rule through the [`SelectorEngine`].
//! 4. Resolve every matched element's style and write the attributes back.
//! 5. Tidy up: drop inlined stylesheet elements, keep unsupported media
//!    queries, strip `id`/`class` and comments as configured.

use std::collections::{HashMap, HashSet};

use mailstyle_common::url::resolve_url;
use mailstyle_common::{Fetch, FetchError, HttpFetcher, Warnings};
use mailstyle_css::cleaner::{clean_with_media, is_supported_media};
use mailstyle_css::{
    ImportError, ImportResolver, RuleSet, RuleTable, attribute_updates, is_supported_selector,
    resolve_style,
};
use tracing::{debug, info};

use crate::document::{Dom, ParseHtml, SelectorEngine};
use crate::error::InlineError;
use crate::options::InlineOptions;

/// Attribute that excludes a `<style>` or `<link>` element from inlining
/// when set to [`IGNORE_VALUE`]. Such elements are left in the document.
///
/// Shares the `premailer` name with
/// [`DIRECTIVE_PREFIX`](mailstyle_css::attributes::DIRECTIVE_PREFIX), so
/// templates written for premailer keep working unchanged.
pub const IGNORE_ATTRIBUTE: &str = "data-premailer";

/// See [`IGNORE_ATTRIBUTE`].
pub const IGNORE_VALUE: &str = "ignore";

/// The output of [`Inliner::inline_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResult {
    /// The serialized document.
    pub html: String,
    /// Non-fatal problems, in the order they occurred.
    pub warnings: Vec<String>,
}

/// Moves stylesheet rules into `style` attributes.
///
/// Holds no per-document state: every run gets a fresh import cache, so one
/// inliner can process any number of documents.
#[derive(Debug, Clone)]
pub struct Inliner<F, S> {
    fetcher: F,
    selectors: S,
}

impl<S> Inliner<HttpFetcher, S> {
    /// Create an inliner that loads stylesheets with the default
    /// [`HttpFetcher`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the HTTP client cannot be built.
    pub fn with_http(selectors: S) -> Result<Self, FetchError> {
        Ok(Self::new(HttpFetcher::new()?, selectors))
    }
}

/// Stylesheets gathered from one document.
struct Collected<N> {
    /// Raw CSS, in cascade order.
    sources: Vec<String>,
    /// The `<style>`/`<link>` elements the CSS came from.
    elements: Vec<N>,
}

impl<F: Fetch, S> Inliner<F, S> {
    /// Create an inliner loading external stylesheets through `fetcher` and
    /// matching selectors with `selectors`.
    #[must_use]
    pub const fn new(fetcher: F, selectors: S) -> Self {
        Self { fetcher, selectors }
    }

    /// The fetch capability used for links and imports.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Parse `html`, inline its styles and serialize the result.
    ///
    /// # Errors
    ///
    /// See [`Inliner::inline`].
    pub fn inline_html<D>(
        &self,
        html: &str,
        options: &InlineOptions,
    ) -> Result<InlineResult, InlineError>
    where
        D: ParseHtml,
        S: SelectorEngine<D>,
    {
        let mut dom = D::parse_html(html);
        let warnings = self.inline(&mut dom, options)?;
        Ok(InlineResult {
            html: dom.serialize(&options.serialize),
            warnings,
        })
    }

    /// Inline the styles of `dom` in place, returning the warnings.
    ///
    /// # Errors
    ///
    /// Returns [`InlineError::Stylesheet`] or [`InlineError::Import`] when an
    /// external stylesheet cannot be fetched, unless
    /// [`InlineOptions::stylesheet_fetch_warnings`] turns those failures into
    /// warnings.
    pub fn inline<D>(&self, dom: &mut D, options: &InlineOptions) -> Result<Vec<String>, InlineError>
    where
        D: Dom,
        S: SelectorEngine<D>,
    {
        let mut warnings = Warnings::new();

        // STEP 1: Collect stylesheets.
        let collected = self.collect_stylesheets(dom, options, &mut warnings)?;

        // STEP 2: Clean and parse into one table.
        let mut rules = RuleTable::new();
        let mut unsupported_media = Vec::new();
        for css in &collected.sources {
            let cleaned = clean_with_media(css);
            rules.parse(&cleaned.css);
            unsupported_media.extend(cleaned.unsupported_media);
        }
        debug!(
            stylesheets = collected.sources.len(),
            rules = rules.len(),
            "parsed stylesheets"
        );

        // STEP 3: Match.
        let matched = self.match_rules(&*dom, &rules, options);

        // STEP 4: Resolve and write back, in document order.
        for node in dom.elements() {
            let Some(node_rules) = matched.get(&node) else {
                continue;
            };
            let resolved = resolve_style(node_rules.iter().copied(), dom.attribute(node, "style"));
            let updates = attribute_updates(
                &resolved,
                dom.tag_name(node),
                |name| dom.attribute(node, name).is_some(),
                options.emit_important,
            );

            if !updates.iter().any(|update| update.name == "style") {
                dom.remove_attribute(node, "style");
            }
            for update in updates {
                dom.set_attribute(node, &update.name, &update.value);
            }
        }

        // STEP 5: Tidy up.
        if options.remove_style_elements {
            for node in collected.elements {
                dom.remove(node);
            }
            if options.preserve_media_queries && !unsupported_media.is_empty() {
                dom.append_style(&unsupported_media.join("\n"));
            }
        }
        if options.strip_id_and_class {
            for node in dom.elements() {
                dom.remove_attribute(node, "id");
                dom.remove_attribute(node, "class");
            }
        }
        if options.remove_comments {
            dom.remove_comments();
        }

        info!(
            elements = matched.len(),
            warnings = warnings.len(),
            "inlined document"
        );
        Ok(warnings.into_vec())
    }

    fn collect_stylesheets<D: Dom>(
        &self,
        dom: &D,
        options: &InlineOptions,
        warnings: &mut Warnings,
    ) -> Result<Collected<D::Node>, InlineError> {
        let mut imports = ImportResolver::new(|url: &str| self.fetcher.fetch(url));
        let document_base = options.base_url.as_deref().unwrap_or_default();
        let mut collected = Collected {
            sources: Vec::new(),
            elements: Vec::new(),
        };

        for node in dom.stylesheet_elements() {
            if is_ignored(dom, node) || !applies_to_screen(dom, node) {
                continue;
            }

            let (css, base) = if dom.tag_name(node).eq_ignore_ascii_case("style") {
                let css = dom.first_text(node).unwrap_or_default();
                (css.to_string(), document_base.to_string())
            } else if is_stylesheet_link(dom, node) {
                let Some(href) = dom.attribute(node, "href") else {
                    continue;
                };
                let url = resolve_url(href, options.base_url.as_deref());
                debug!(url, "fetching stylesheet");
                match self.fetcher.fetch(&url) {
                    Ok(body) => (body, url),
                    Err(source) if options.stylesheet_fetch_warnings => {
                        warnings.push("stylesheet", &format!("failed to load '{url}': {source}"));
                        continue;
                    }
                    Err(source) => return Err(InlineError::Stylesheet { href: url, source }),
                }
            } else {
                continue;
            };

            let imported = new_imports(&mut imports, &base, &css, options, warnings)?;
            collected.sources.extend(imported);
            collected.sources.push(css);
            collected.elements.push(node);
        }

        if let Some(css) = options.css.as_deref() {
            let imported = new_imports(&mut imports, document_base, css, options, warnings)?;
            collected.sources.extend(imported);
            collected.sources.push(css.to_string());
        }

        Ok(collected)
    }

    /// Map every element to the rules matching it. Elements selected by
    /// [`InlineOptions::ignore_elements`] get none.
    fn match_rules<'r, D>(
        &self,
        dom: &D,
        rules: &'r RuleTable,
        options: &InlineOptions,
    ) -> HashMap<D::Node, Vec<&'r RuleSet>>
    where
        D: Dom,
        S: SelectorEngine<D>,
    {
        let ignored: HashSet<D::Node> = options
            .ignore_elements
            .as_deref()
            .map(|selector| self.select(dom, selector))
            .unwrap_or_default()
            .into_iter()
            .collect();

        let mut matched: HashMap<D::Node, Vec<&RuleSet>> = HashMap::new();
        for rule in rules.iter() {
            if !is_supported_selector(rule.selector()) {
                debug!(selector = rule.selector(), "skipping unsupported selector");
                continue;
            }
            for node in self.select(dom, rule.selector()) {
                if !ignored.contains(&node) {
                    matched.entry(node).or_default().push(rule);
                }
            }
        }
        matched
    }

    /// Run a selector; a selector the engine rejects matches nothing.
    fn select<D>(&self, dom: &D, selector: &str) -> Vec<D::Node>
    where
        D: Dom,
        S: SelectorEngine<D>,
    {
        self.selectors
            .select(dom, selector)
            .unwrap_or_else(|error| {
                debug!(%error, "skipping selector");
                Vec::new()
            })
    }
}

/// Resolve the imports of one stylesheet, returning the bodies fetched for
/// it (those already fetched for an earlier stylesheet are not repeated).
fn new_imports<G: Fetch>(
    imports: &mut ImportResolver<G>,
    base_url: &str,
    css: &str,
    options: &InlineOptions,
    warnings: &mut Warnings,
) -> Result<Vec<String>, InlineError> {
    let before = imports.imports().len();
    if options.stylesheet_fetch_warnings {
        for ImportError::Fetch { url, source } in imports.resolve_lenient(base_url, css) {
            warnings.push("import", &format!("failed to import '{url}': {source}"));
        }
    } else {
        let _ = imports.resolve(base_url, css)?;
    }

    Ok(imports.imports()[before..]
        .iter()
        .map(|import| import.body.clone())
        .collect())
}

fn is_ignored<D: Dom>(dom: &D, node: D::Node) -> bool {
    dom.attribute(node, IGNORE_ATTRIBUTE)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case(IGNORE_VALUE))
}

/// [WHATWG HTML § 4.2.6 The style element](https://html.spec.whatwg.org/multipage/semantics.html#the-style-element)
///
/// "The media attribute says which media the styles apply to. ... The
/// default, if the media attribute is omitted, is "all"".
fn applies_to_screen<D: Dom>(dom: &D, node: D::Node) -> bool {
    dom.attribute(node, "media")
        .is_none_or(|media| media.trim().is_empty() || is_supported_media(media))
}

/// [WHATWG HTML § 4.6.7.12 Link type "stylesheet"](https://html.spec.whatwg.org/multipage/links.html#link-type-stylesheet)
fn is_stylesheet_link<D: Dom>(dom: &D, node: D::Node) -> bool {
    dom.tag_name(node).eq_ignore_ascii_case("link")
        && dom.attribute(node, "rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|keyword| keyword.eq_ignore_ascii_case("stylesheet"))
        })
}
