//! Movie records and the context carried between the movie and rating pages

use serde::{Deserialize, Serialize};

/// Rating value used when the movie has no rating link or the rating page has no score
pub const RATING_NOT_FOUND: &str = "Рейтинг для данного фильма не найден";

/// One extracted movie
///
/// Field names in serialized output are fixed, human-readable labels that
/// downstream consumers depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "Название")]
    pub title: String,

    #[serde(rename = "Жанр")]
    pub genre: String,

    #[serde(rename = "Режиссер")]
    pub director: String,

    #[serde(rename = "Страны")]
    pub countries: String,

    #[serde(rename = "Год")]
    pub year: String,

    #[serde(rename = "Рейтинг IMDb")]
    pub rating: String,
}

impl MovieRecord {
    /// Returns true if a rating was found for this movie
    pub fn has_rating(&self) -> bool {
        self.rating != RATING_NOT_FOUND
    }
}

/// Fields extracted from a movie page while its rating page is being fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMovieContext {
    pub title: String,
    pub genre: String,
    pub director: String,
    pub countries: String,
    pub year: String,
}

impl PendingMovieContext {
    /// Completes the record with a rating, consuming the context
    pub fn into_record(self, rating: impl Into<String>) -> MovieRecord {
        MovieRecord {
            title: self.title,
            genre: self.genre,
            director: self.director,
            countries: self.countries,
            year: self.year,
            rating: rating.into(),
        }
    }
}
