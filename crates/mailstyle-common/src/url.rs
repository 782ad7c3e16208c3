//! URL resolution utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)
//!
//! Stylesheet hrefs are resolved with the `url` crate whenever the base is a
//! real URL. Bases that are not (a bare file name, a relative path) fall back
//! to plain path joining so documents loaded from disk still resolve.

use ::url::Url;

/// [URL Standard § 4.3 URL parsing](https://url.spec.whatwg.org/#url-parsing)
///
/// Resolve a potentially relative URL against a base URL.
///
/// STEP 1: "If url is an absolute URL, return url" (in its canonical form).
///
/// STEP 2: Otherwise, resolve url relative to base. Without a base the href
/// is returned unchanged.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    let href = href.trim();

    // STEP 1: Absolute hrefs only get canonicalized.
    if let Ok(absolute) = Url::parse(href) {
        return absolute.into();
    }

    // STEP 2: Resolve relative URL against base.
    let Some(base) = base_url else {
        return href.to_string();
    };

    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(joined) => joined.into(),
        Err(_) => join_paths(base, href),
    }
}

/// The directory a stylesheet's relative imports are resolved against.
///
/// The base is stripped of its query string, fragment, port and final path
/// segment, keeping the trailing `/`:
///
/// `http://example.com:8080/css/main.css?v=2` becomes `http://example.com/css/`.
#[must_use]
pub fn base_directory(url: &str) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        parsed.set_query(None);
        parsed.set_fragment(None);
        // Fails only for URLs that cannot carry a port, which have none.
        let _ = parsed.set_port(None);
        let directory = parsed
            .path()
            .rfind('/')
            .map_or_else(|| "/".to_string(), |i| parsed.path()[..=i].to_string());
        parsed.set_path(&directory);
        return parsed.into();
    }

    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rfind('/')
        .map_or_else(String::new, |i| without_query[..=i].to_string())
}

/// Join an href onto a base that is not a parseable URL.
fn join_paths(base: &str, href: &str) -> String {
    if href.starts_with('/') || base.is_empty() {
        return href.to_string();
    }
    if base.ends_with('/') {
        return format!("{base}{href}");
    }
    let base_dir = base.rsplit_once('/').map_or("", |(dir, _)| dir);
    if base_dir.is_empty() {
        href.to_string()
    } else {
        format!("{base_dir}/{href}")
    }
}
