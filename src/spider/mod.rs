//! Page parsers for wiki movie categories
//!
//! The spider turns fetched pages into records and follow-up tasks:
//! - category listings yield one movie task per listed article plus the next listing page
//! - movie articles yield a finished record, or a rating task carrying the extracted fields
//! - rating pages yield the finished record
//!
//! Parsers never perform I/O. The HTML document is built and dropped inside each call,
//! so a shared `MovieSpider` can be used from any number of workers.

mod category;
mod movie;
mod rating;
mod record;
mod task;

pub use record::{MovieRecord, PendingMovieContext, RATING_NOT_FOUND};
pub use task::{Continuation, ParseOutput, Task};

use crate::config::SpiderConfig;
use crate::MovieError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Decoded response body
    pub body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Parses the body into a queryable document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Compiled selectors used by the parsers
#[derive(Debug)]
struct Selectors {
    title: Selector,
    infobox_header: Selector,
    header_cell: Selector,
    link: Selector,
    rating_score: Selector,
    category_link: Selector,
}

impl Selectors {
    fn new() -> Result<Self, MovieError> {
        Ok(Self {
            title: selector("table.infobox tbody tr th.infobox-above")?,
            infobox_header: selector("table.infobox tbody tr th")?,
            header_cell: selector("th")?,
            link: selector("a[href]")?,
            rating_score: selector(
                r#"div[data-testid="hero-rating-bar__aggregate-rating__score"] span"#,
            )?,
            category_link: selector("div.mw-category-group a[href]")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, MovieError> {
    Selector::parse(css).map_err(|e| MovieError::Selector {
        css: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Returns the element immediately following `element`, skipping text nodes
fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

/// Stateless parser set for one wiki layout
#[derive(Debug)]
pub struct MovieSpider {
    config: SpiderConfig,
    selectors: Selectors,
}

impl MovieSpider {
    /// Creates a spider using the given labels
    ///
    /// # Errors
    ///
    /// Returns `MovieError::Selector` if a built-in selector fails to compile.
    pub fn new(config: SpiderConfig) -> Result<Self, MovieError> {
        Ok(Self {
            config,
            selectors: Selectors::new()?,
        })
    }

    /// The labels this spider matches against
    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    /// Builds the first task of a crawl from the seed category URL
    pub fn start_task(seed: Url) -> Task {
        Task::category(seed, 1)
    }

    /// Runs the parser selected by the task's continuation
    ///
    /// Only movie pages can fail (see [`MovieSpider::parse_movie`]).
    pub fn parse(&self, page: &Page, continuation: Continuation) -> Result<ParseOutput, MovieError> {
        match continuation {
            Continuation::Category { page_number } => Ok(self.parse_category(page, page_number)),
            Continuation::Movie => self.parse_movie(page),
            Continuation::Rating(context) => Ok(self.parse_rating(page, context)),
        }
    }
}
