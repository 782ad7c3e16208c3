//! Error types for the inliner.

use mailstyle_common::FetchError;
use mailstyle_css::ImportError;
use thiserror::Error;

/// A failure that aborts an inlining run.
///
/// Fetch failures only abort the run when
/// [`InlineOptions::stylesheet_fetch_warnings`](crate::InlineOptions::stylesheet_fetch_warnings)
/// is off; otherwise they are reported as warnings.
#[derive(Debug, Error)]
pub enum InlineError {
    /// A `<link rel="stylesheet">` target could not be fetched.
    #[error("failed to load stylesheet '{href}'")]
    Stylesheet {
        /// The resolved URL of the stylesheet.
        href: String,
        /// The transport failure reported by the fetcher.
        #[source]
        source: FetchError,
    },

    /// An `@import` target could not be fetched.
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl InlineError {
    /// The URL that failed to load.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Stylesheet { href, .. } => href,
            Self::Import(error) => error.url(),
        }
    }
}
