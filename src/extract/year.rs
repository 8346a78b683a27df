use once_cell::sync::Lazy;
use regex::Regex;

/// Value used when no year could be found
pub const UNKNOWN_YEAR: &str = "Год неизвестен";

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern compiles"));

/// Extracts the earliest four-digit year mentioned in `date_strings`
///
/// Every non-overlapping run of four digits in every string is a candidate;
/// the smallest candidate wins, so an original premiere beats a later
/// re-release listed in the same infobox row. Absent or empty input, or input
/// without any candidate, yields [`UNKNOWN_YEAR`].
///
/// # Examples
///
/// ```
/// use wiki_movies::extract::{extract_year, UNKNOWN_YEAR};
///
/// let dates = ["premiered 1994", "re-released 2004"];
/// assert_eq!(extract_year(Some(&dates[..])), "1994");
/// assert_eq!(extract_year::<&str>(None), UNKNOWN_YEAR);
/// ```
pub fn extract_year<S: AsRef<str>>(date_strings: Option<&[S]>) -> String {
    let Some(date_strings) = date_strings else {
        return UNKNOWN_YEAR.to_string();
    };

    date_strings
        .iter()
        .flat_map(|text| YEAR.find_iter(text.as_ref()))
        .map(|m| m.as_str())
        .min()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}
