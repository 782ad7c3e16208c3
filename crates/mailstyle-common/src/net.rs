//! Resource fetching for linked and imported stylesheets.
//!
//! The inliner never performs I/O directly. Every load goes through the
//! [`Fetch`] capability handed to it at construction, so tests can substitute
//! a closure and callers can add their own caching, timeouts or retries.
//!
//! [`HttpFetcher`] is the default implementation: blocking HTTP(S) through
//! `reqwest`, `file:` URLs through the filesystem, and `data:` URLs decoded
//! in place.
use std::fs;
use std::time::Duration;

use base64::Engine;
use tracing::debug;

use crate::error::FetchError;

/// User-Agent header sent with all requests.
///
/// Mimics a common desktop browser to avoid basic bot detection.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request timeout.
const TIMEOUT: Duration = Duration::from_secs(30);

/// A synchronous capability to load the text behind an absolute URL.
///
/// Implemented for every `Fn(&str) -> Result<String, FetchError>`, which is
/// how tests stub the network.
pub trait Fetch {
    /// Fetch `url` and return its body as text.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the resource cannot be loaded. The
    /// inliner surfaces it unchanged and never retries.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self(url)
    }
}

/// The default [`Fetch`] implementation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be created.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Create a fetcher around an already configured client.
    #[must_use]
    pub const fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    fn fetch_http(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "fetching");
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase());
        match scheme.as_deref() {
            Some("http" | "https") => self.fetch_http(url),
            Some("data") => DataUrl::new(url).decode_text(),
            Some("file") => fetch_file(url),
            _ => Err(FetchError::UnsupportedScheme {
                url: url.to_string(),
            }),
        }
    }
}

/// Read a `file:` URL from the local filesystem.
fn fetch_file(url: &str) -> Result<String, FetchError> {
    let path = ::url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.to_file_path().ok())
        .ok_or_else(|| FetchError::UnsupportedScheme {
            url: url.to_string(),
        })?;
    fs::read_to_string(&path).map_err(|source| FetchError::File { path, source })
}

/// A `data:` URL whose payload is the stylesheet itself.
///
/// Base64 payloads are decoded; anything else is taken verbatim.
pub struct DataUrl<'a> {
    /// The full raw `data:` URL string (e.g. `data:text/css;base64,...`).
    raw: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Wrap a raw data URL string.
    #[must_use]
    pub const fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUrl`] if the URL has no `,` separator or the
    /// base64 payload is invalid.
    pub fn decode(&self) -> Result<Vec<u8>, FetchError> {
        let body = self
            .raw
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("data:"))
            .map_or(self.raw, |_| &self.raw[5..]);
        let Some((metadata, data)) = body.split_once(',') else {
            return Err(FetchError::DataUrl {
                reason: "missing comma".to_string(),
            });
        };

        if metadata.to_ascii_lowercase().ends_with(";base64") {
            let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| FetchError::DataUrl {
                    reason: format!("base64 decode error: {e}"),
                })
        } else {
            Ok(data.as_bytes().to_vec())
        }
    }

    /// Decode the payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::DataUrl`] if decoding fails or the payload is not
    /// valid UTF-8.
    pub fn decode_text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.decode()?).map_err(|e| FetchError::DataUrl {
            reason: format!("payload is not UTF-8: {e}"),
        })
    }
}
