//! Text helpers shared by the page parsers
//!
//! - `normalize`: joins the meaningful text fragments of a table cell
//! - `extract_year`: picks the earliest four-digit year from date strings

mod text;
mod year;

pub use text::{normalize, FRAGMENT_SEPARATOR};
pub use year::{extract_year, UNKNOWN_YEAR};
