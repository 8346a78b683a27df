use once_cell::sync::Lazy;
use regex::Regex;

/// Separator placed between retained fragments
pub const FRAGMENT_SEPARATOR: &str = ", ";

static LEADING_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\b\w+\b").expect("word pattern compiles"));

/// Joins the text fragments that start with a word
///
/// A fragment is kept only when its very first character begins a word.
/// Separators between links in an infobox cell (`", "`, `" и "`, line
/// breaks) and trailing remarks such as `" (1994)"` are dropped. Retained
/// fragments are kept verbatim and joined with `", "` in their original order.
///
/// # Examples
///
/// ```
/// use wiki_movies::extract::normalize;
///
/// assert_eq!(normalize(&["драма", ", ", "комедия"]), "драма, комедия");
/// assert_eq!(normalize::<&str>(&[]), "");
/// ```
pub fn normalize<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .filter(|fragment| LEADING_WORD.is_match(fragment))
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}
