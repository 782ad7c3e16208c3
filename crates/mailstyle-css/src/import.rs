//! `@import` resolution.
//!
//! [CSS Cascading Level 4 § 2 Importing Style Sheets](https://www.w3.org/TR/css-cascade-4/#at-import)
//!
//! The resolver follows `@import` statements through an injected [`Fetch`]
//! capability and flattens them into an ordered list of stylesheet bodies.
//! Every URL is requested at most once per resolver, across all calls, which
//! also makes import cycles terminate.

use std::collections::HashSet;

use mailstyle_common::Fetch;
use mailstyle_common::url::{base_directory, resolve_url};
use tracing::debug;

use crate::error::ImportError;

/// Import nesting depth at which scanning stops.
///
/// Bodies fetched at depth 1 are kept but never scanned for their own
/// imports, so a chain `level0 -> level1 -> level2 -> level3` yields
/// `level1` and `level2` only.
pub const MAX_IMPORT_DEPTH: usize = 2;

/// One fetched `@import` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedStylesheet {
    /// The absolute URL the body was fetched from.
    pub url: String,
    /// The raw stylesheet text.
    pub body: String,
}

/// Follows `@import` statements, remembering every URL it has fetched.
///
/// Not meant to be shared between threads; use one resolver per document.
#[derive(Debug)]
pub struct ImportResolver<F> {
    fetcher: F,
    imports: Vec<ImportedStylesheet>,
    visited: HashSet<String>,
}

impl<F: Fetch> ImportResolver<F> {
    /// Create a resolver that loads imports through `fetcher`.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            imports: Vec::new(),
            visited: HashSet::new(),
        }
    }

    /// The fetch capability this resolver loads through.
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Every import fetched so far, in fetch order.
    #[must_use]
    pub fn imports(&self) -> &[ImportedStylesheet] {
        &self.imports
    }

    /// Resolve the imports of `css`, a stylesheet located at `base_url`.
    ///
    /// Returns the accumulated import list of this resolver: bodies fetched
    /// by earlier calls come first, followed by the ones this call fetched.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Fetch`] for the first import that fails to
    /// load. Imports fetched before the failure stay recorded, and the
    /// failed URL is not requested again.
    pub fn resolve(
        &mut self,
        base_url: &str,
        css: &str,
    ) -> Result<&[ImportedStylesheet], ImportError> {
        let mut failures = Vec::new();
        self.resolve_at(base_url, css, 0, OnFailure::Stop, &mut failures)?;
        Ok(&self.imports)
    }

    /// Resolve the imports of `css` like [`ImportResolver::resolve`], but
    /// keep going past imports that fail to load.
    ///
    /// Returns every failure of this call in the order it happened; the
    /// imports that did load are in [`ImportResolver::imports`].
    pub fn resolve_lenient(&mut self, base_url: &str, css: &str) -> Vec<ImportError> {
        let mut failures = Vec::new();
        if let Err(error) = self.resolve_at(base_url, css, 0, OnFailure::Continue, &mut failures) {
            failures.push(error);
        }
        failures
    }

    fn resolve_at(
        &mut self,
        base_url: &str,
        css: &str,
        depth: usize,
        on_failure: OnFailure,
        failures: &mut Vec<ImportError>,
    ) -> Result<(), ImportError> {
        if depth >= MAX_IMPORT_DEPTH || css.trim().is_empty() {
            return Ok(());
        }

        let directory = base_directory(base_url);
        for href in find_imports(css) {
            let url = resolve_url(href, Some(&directory));
            // Marked before fetching: a cycle back to this URL stops, and a
            // URL that failed once is not requested again.
            if !self.visited.insert(url.clone()) {
                debug!(url, "import already requested");
                continue;
            }

            debug!(url, depth, "fetching import");
            let body = match self.fetcher.fetch(&url) {
                Ok(body) => body,
                Err(source) => {
                    let error = ImportError::Fetch { url, source };
                    match on_failure {
                        OnFailure::Stop => return Err(error),
                        OnFailure::Continue => {
                            failures.push(error);
                            continue;
                        }
                    }
                }
            };

            self.imports.push(ImportedStylesheet {
                url: url.clone(),
                body: body.clone(),
            });
            self.resolve_at(&url, &body, depth + 1, on_failure, failures)?;
        }
        Ok(())
    }
}

/// What a resolve run does when an import fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    Stop,
    Continue,
}

/// [§ 2 Importing Style Sheets](https://www.w3.org/TR/css-cascade-4/#at-import)
///
/// "The @import rule ... syntax is: @import [ <url> | <string> ] ... ;"
///
/// Collect the href of every `@import` statement, in source order. Both
/// `url(...)` (quoted or not) and bare string forms are accepted; anything
/// between the target and the `;` (media queries, `layer(...)`) is ignored.
/// A statement without its `;` is not an import.
fn find_imports(css: &str) -> Vec<&str> {
    const KEYWORD: &str = "@import";

    let lowered = css.to_ascii_lowercase();
    let mut hrefs = Vec::new();
    let mut consumed = 0;

    for (at, _) in lowered.match_indices(KEYWORD) {
        if at < consumed {
            continue;
        }
        let target_start = at + KEYWORD.len();
        let Some((href, after_target)) = import_target(css, target_start) else {
            continue;
        };
        let Some(terminator) = css[after_target..].find([';', '{', '}']) else {
            continue;
        };
        if css.as_bytes()[after_target + terminator] != b';' {
            continue;
        }

        consumed = after_target + terminator + 1;
        if !href.is_empty() {
            hrefs.push(href);
        }
    }
    hrefs
}

/// Parse the target of an `@import` whose keyword ends at `start`.
///
/// Returns the trimmed href and the offset just past the target.
fn import_target(css: &str, start: usize) -> Option<(&str, usize)> {
    let rest = &css[start..];
    let skipped = rest.len() - rest.trim_start().len();
    let target = start + skipped;
    let text = &css[target..];

    if text
        .get(..4)
        .is_some_and(|function| function.eq_ignore_ascii_case("url("))
    {
        let inner_start = target + 4;
        let close = css[inner_start..].find(')')? + inner_start;
        let href = unquote(css[inner_start..close].trim());
        return Some((href.trim(), close + 1));
    }

    let quote = text.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let close = css[target + 1..].find(quote)? + target + 1;
    Some((css[target + 1..close].trim(), close + 1))
}

/// Strip one pair of matching quotes.
fn unquote(text: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| text.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(text)
}
