//! Movie article parser

use crate::extract::{extract_year, normalize};
use crate::spider::{
    next_element_sibling, MovieSpider, Page, ParseOutput, PendingMovieContext, Task,
    RATING_NOT_FOUND,
};
use crate::url::resolve_link;
use crate::MovieError;
use scraper::{ElementRef, Html};
use url::Url;

impl MovieSpider {
    /// Parses a movie article
    ///
    /// Produces exactly one of:
    /// - a rating task carrying title, genre, director, countries and year, when the
    ///   infobox links to the rating site
    /// - a finished record whose rating is [`RATING_NOT_FOUND`] otherwise
    ///
    /// # Errors
    ///
    /// Returns `MovieError::MissingTitle` when the page has no infobox title cell.
    pub fn parse_movie(&self, page: &Page) -> Result<ParseOutput, MovieError> {
        let document = page.document();

        let title = self
            .extract_title(&document)
            .ok_or_else(|| MovieError::MissingTitle {
                url: page.url.to_string(),
            })?;

        let genre = normalize(&self.infobox_values(&document, &self.config.genre_marker));
        let director = normalize(&self.infobox_values(&document, &self.config.director_marker));
        let countries = normalize(&self.infobox_values(&document, &self.config.countries_marker));
        let year_fragments = self.infobox_values(&document, &self.config.year_marker);
        let year = extract_year(Some(&year_fragments[..]));

        let context = PendingMovieContext {
            title,
            genre,
            director,
            countries,
            year,
        };

        let mut output = ParseOutput::new();
        match self.rating_link(&document, &page.url) {
            Some(target) => {
                tracing::trace!("Following rating link {} for '{}'", target, context.title);
                output.add_request(Task::rating(target, context));
            }
            None => {
                tracing::trace!("No rating link for '{}'", context.title);
                output.add_item(context.into_record(RATING_NOT_FOUND));
            }
        }

        Ok(output)
    }

    /// Text of the infobox title cell
    ///
    /// Prefers the first non-blank text node directly inside the cell (the
    /// title proper, without nested original-title spans) and falls back to the
    /// whole cell text.
    fn extract_title(&self, document: &Html) -> Option<String> {
        let cell = document.select(&self.selectors.title).next()?;

        let direct = cell
            .children()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .find(|text| !text.is_empty());

        Some(match direct {
            Some(text) => text.to_string(),
            None => cell.text().collect::<String>().trim().to_string(),
        })
    }

    /// All text fragments of infobox value cells whose header contains `marker`
    ///
    /// A row matches when its header cell text contains the marker and the
    /// header is immediately followed by a `td`. Fragments from every matching
    /// row are returned in document order.
    fn infobox_values<'a>(&self, document: &'a Html, marker: &str) -> Vec<&'a str> {
        document
            .select(&self.selectors.infobox_header)
            .filter(|header| header.text().collect::<String>().contains(marker))
            .filter_map(next_element_sibling)
            .filter(|cell| cell.value().name() == "td")
            .flat_map(|cell| cell.text())
            .collect()
    }

    /// Link to the rating site, resolved against the page URL
    ///
    /// Looks for a header cell whose first link names the rating authority
    /// and takes the first link inside any following value cell.
    fn rating_link(&self, document: &Html, base: &Url) -> Option<Url> {
        document
            .select(&self.selectors.header_cell)
            .filter(|header| self.names_rating_authority(*header))
            .flat_map(|header| {
                header
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| cell.value().name() == "td")
            })
            .flat_map(|cell| cell.select(&self.selectors.link))
            .filter_map(|link| link.value().attr("href"))
            .find_map(|href| resolve_link(href, base))
    }

    fn names_rating_authority(&self, header: ElementRef<'_>) -> bool {
        header
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "a")
            .map(|link| {
                link.text()
                    .collect::<String>()
                    .contains(&self.config.rating_authority)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpiderConfig;
    use crate::extract::UNKNOWN_YEAR;
    use crate::spider::Continuation;

    fn spider() -> MovieSpider {
        MovieSpider::new(SpiderConfig::default()).unwrap()
    }

    fn page(body: &str) -> Page {
        Page::new(
            Url::parse("https://ru.wikipedia.org/wiki/Побег_из_Шоушенка").unwrap(),
            body,
        )
    }

    const INFOBOX_WITH_IMDB: &str = r#"
        <html><body>
        <table class="infobox">
          <tbody>
            <tr><th colspan="2" class="infobox-above">
              Побег из Шоушенка
              <span lang="en">The Shawshank Redemption</span>
            </th></tr>
            <tr><th>Жанр</th><td><a href="/wiki/Драма">драма</a>, <a href="/wiki/Экранизация">экранизация</a></td></tr>
            <tr><th>Режиссёр</th><td><a href="/wiki/Фрэнк_Дарабонт">Фрэнк Дарабонт</a></td></tr>
            <tr><th>Страна</th><td><span>США</span></td></tr>
            <tr><th>Год</th><td>1994<sup>[1]</sup>, 2004 (переиздание)</td></tr>
            <tr><th><a href="/wiki/Internet_Movie_Database">IMDb</a></th>
                <td><a href="https://www.imdb.com/title/tt0111161/">ID 0111161</a></td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_movie_with_rating_link_schedules_rating_fetch() {
        let output = spider().parse_movie(&page(INFOBOX_WITH_IMDB)).unwrap();

        assert!(output.items.is_empty());
        assert_eq!(output.requests.len(), 1);

        let task = &output.requests[0];
        assert_eq!(task.target.as_str(), "https://www.imdb.com/title/tt0111161/");
        assert_eq!(
            task.continuation,
            Continuation::Rating(PendingMovieContext {
                title: "Побег из Шоушенка".to_string(),
                genre: "драма, экранизация".to_string(),
                director: "Фрэнк Дарабонт".to_string(),
                countries: "США".to_string(),
                year: "1994".to_string(),
            })
        );
    }

    #[test]
    fn test_movie_without_rating_link_emits_record() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Сталкер</th></tr>
              <tr><th>Жанры</th><td>драма<br>фантастика</td></tr>
              <tr><th>Режиссёры</th><td>Андрей Тарковский</td></tr>
              <tr><th>Страны</th><td>СССР</td></tr>
              <tr><th>Год</th><td>25 мая 1979</td></tr>
            </tbody></table>
        "#;

        let output = spider().parse_movie(&page(body)).unwrap();

        assert!(output.requests.is_empty());
        assert_eq!(output.items.len(), 1);

        let record = &output.items[0];
        assert_eq!(record.title, "Сталкер");
        assert_eq!(record.genre, "драма, фантастика");
        assert_eq!(record.director, "Андрей Тарковский");
        assert_eq!(record.countries, "СССР");
        assert_eq!(record.year, "1979");
        assert_eq!(record.rating, RATING_NOT_FOUND);
    }

    #[test]
    fn test_missing_rows_degrade_to_empty_values() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">  Безымянный фильм  </th></tr>
            </tbody></table>
        "#;

        let output = spider().parse_movie(&page(body)).unwrap();
        let record = &output.items[0];

        assert_eq!(record.title, "Безымянный фильм");
        assert_eq!(record.genre, "");
        assert_eq!(record.director, "");
        assert_eq!(record.countries, "");
        assert_eq!(record.year, UNKNOWN_YEAR);
        assert_eq!(record.rating, RATING_NOT_FOUND);
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let body = r#"<table class="infobox"><tbody><tr><th>Жанр</th><td>драма</td></tr></tbody></table>"#;
        let result = spider().parse_movie(&page(body));
        assert!(matches!(result, Err(MovieError::MissingTitle { .. })));
    }

    #[test]
    fn test_title_falls_back_to_nested_text() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above"><i>Солярис</i></th></tr>
            </tbody></table>
        "#;
        let output = spider().parse_movie(&page(body)).unwrap();
        assert_eq!(output.items[0].title, "Солярис");
    }

    #[test]
    fn test_rows_outside_infobox_are_ignored() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Зеркало</th></tr>
            </tbody></table>
            <table class="wikitable"><tbody>
              <tr><th>Жанр</th><td>не инфобокс</td></tr>
            </tbody></table>
        "#;
        let output = spider().parse_movie(&page(body)).unwrap();
        assert_eq!(output.items[0].genre, "");
    }

    #[test]
    fn test_header_without_adjacent_value_cell() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Иваново детство</th></tr>
              <tr><th colspan="2">Жанр</th></tr>
            </tbody></table>
        "#;
        let output = spider().parse_movie(&page(body)).unwrap();
        assert_eq!(output.items[0].genre, "");
    }

    #[test]
    fn test_relative_rating_link_is_resolved() {
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Андрей Рублёв</th></tr>
              <tr><th><a href="/wiki/IMDb">IMDb</a></th><td><span><a href="/title/tt0060107/">ID 0060107</a></span></td></tr>
            </tbody></table>
        "#;
        let output = spider().parse_movie(&page(body)).unwrap();
        assert_eq!(
            output.requests[0].target.as_str(),
            "https://ru.wikipedia.org/title/tt0060107/"
        );
    }

    #[test]
    fn test_rating_header_needs_link_text() {
        // Plain header text without a link does not name the rating site
        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Ностальгия</th></tr>
              <tr><th>IMDb</th><td><a href="https://www.imdb.com/title/tt0086022/">ID</a></td></tr>
            </tbody></table>
        "#;
        let output = spider().parse_movie(&page(body)).unwrap();
        assert!(output.requests.is_empty());
        assert_eq!(output.items.len(), 1);
    }

    #[test]
    fn test_custom_markers() {
        let config = SpiderConfig {
            genre_marker: "Genre".to_string(),
            director_marker: "Directed".to_string(),
            countries_marker: "Countr".to_string(),
            year_marker: "Release".to_string(),
            ..SpiderConfig::default()
        };
        let spider = MovieSpider::new(config).unwrap();

        let body = r#"
            <table class="infobox"><tbody>
              <tr><th class="infobox-above">Stalker</th></tr>
              <tr><th>Directed by</th><td>Andrei Tarkovsky</td></tr>
              <tr><th>Countries</th><td>Soviet Union</td></tr>
              <tr><th>Release date</th><td>May 1979</td></tr>
            </tbody></table>
        "#;
        let output = spider.parse_movie(&page(body)).unwrap();
        let record = &output.items[0];
        assert_eq!(record.director, "Andrei Tarkovsky");
        assert_eq!(record.countries, "Soviet Union");
        assert_eq!(record.year, "1979");
    }
}
