//! Error types for stylesheet resolution.

use mailstyle_common::FetchError;
use thiserror::Error;

/// A failure while following `@import` statements.
#[derive(Debug, Error)]
pub enum ImportError {
    /// An imported stylesheet could not be fetched.
    #[error("failed to import '{url}'")]
    Fetch {
        /// The resolved, absolute URL of the import.
        url: String,
        /// The transport failure reported by the fetcher.
        #[source]
        source: FetchError,
    },
}

impl ImportError {
    /// The URL of the import that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. } => url,
        }
    }
}
