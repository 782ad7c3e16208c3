//! Common utilities for mailstyle.
//!
//! This crate provides shared infrastructure used by the inliner:
//! - **Fetch** - the pluggable resource loader and its default HTTP/file/data implementation
//! - **URL resolution** - joining stylesheet hrefs against a document or stylesheet base
//! - **Warning System** - de-duplicated, non-fatal warnings collected per run

pub mod error;
pub mod net;
pub mod url;
pub mod warning;

pub use error::FetchError;
pub use net::{Fetch, HttpFetcher};
pub use warning::Warnings;
