//! URL handling module for Wiki-Movies
//!
//! This module provides link resolution against the page being parsed, URL
//! normalization for duplicate detection, and host extraction for per-host
//! politeness.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Extracts the lowercase host from a URL, including a non-default port
///
/// Two mock servers on one machine differ only by port, so the port is part
/// of the politeness key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_movies::url::extract_host;
///
/// let url = Url::parse("https://RU.Wikipedia.org/wiki/Сталкер").unwrap();
/// assert_eq!(extract_host(&url), Some("ru.wikipedia.org".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should not be followed:
/// - javascript:, mailto:, tel: and data: hrefs
/// - empty and fragment-only hrefs (same page anchors)
/// - hrefs that do not resolve to an HTTP(S) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wiki_movies::url::resolve_link;
///
/// let base = Url::parse("https://ru.wikipedia.org/wiki/Категория:Фильмы").unwrap();
/// let next = resolve_link("/w/index.php?pagefrom=Б", &base).unwrap();
/// assert_eq!(next.host_str(), Some("ru.wikipedia.org"));
/// assert_eq!(next.path(), "/w/index.php");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
