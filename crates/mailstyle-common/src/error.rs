//! Error types for resource fetching.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A failure to load an external resource.
///
/// Every transport variant carries the URL that failed so callers can report
/// it or downgrade it into a warning.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {reason}")]
    Client {
        /// Description of the underlying failure.
        reason: String,
    },

    /// The request could not be sent or timed out.
    #[error("request to '{url}' failed: {reason}")]
    Request {
        /// The requested URL.
        url: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP error {status} for '{url}'")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be read as text.
    #[error("failed to read response body from '{url}': {reason}")]
    Body {
        /// The requested URL.
        url: String,
        /// Description of the underlying failure.
        reason: String,
    },

    /// A `file:` URL could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    File {
        /// The local path the URL pointed at.
        path: PathBuf,
        /// The I/O error.
        source: io::Error,
    },

    /// A `data:` URL was malformed.
    #[error("invalid data URL: {reason}")]
    DataUrl {
        /// Why decoding failed.
        reason: String,
    },

    /// The URL uses a scheme the fetcher cannot load.
    #[error("unsupported URL scheme in '{url}'")]
    UnsupportedScheme {
        /// The requested URL.
        url: String,
    },
}

impl FetchError {
    /// The URL (or path) associated with this failure, if any.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::UnsupportedScheme { url } => Some(url.clone()),
            Self::File { path, .. } => Some(path.display().to_string()),
            Self::Client { .. } | Self::DataUrl { .. } => None,
        }
    }
}
