use crate::UrlError;
use url::Url;

/// Query parameters that never change which article a URL shows
const IGNORED_PARAMS: &[&str] = &["fbclid", "gclid", "ref", "source", "oldformat", "wprov"];

/// Normalizes a URL into the key used to detect duplicate fetches
///
/// The result is only compared, never fetched, so it may drop parts a
/// server would care about:
///
/// 1. Reject anything that is not an HTTP(S) URL with a host
/// 2. Lowercase the host and drop a `www.` prefix
/// 3. Fold mobile wiki hosts (`ru.m.wikipedia.org`) onto the desktop host
/// 4. Remove dot segments, empty segments and the trailing slash
/// 5. Remove the fragment
/// 6. Drop tracking parameters and sort the rest by key
///
/// # Examples
///
/// ```
/// use wiki_movies::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/wiki/Page/#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/wiki/Page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?;
    let host = canonical_host(host);
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host '{}': {}", host, e)))?;

    let path = canonical_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_ignored_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn canonical_host(host: &str) -> String {
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    match host.split_once(".m.") {
        Some((language, site)) if !language.contains('.') => format!("{}.{}", language, site),
        _ => host.to_string(),
    }
}

fn canonical_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn is_ignored_param(key: &str) -> bool {
    key.starts_with("utm_") || IGNORED_PARAMS.contains(&key)
}
