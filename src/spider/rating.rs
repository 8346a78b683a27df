//! Rating page parser

use crate::spider::{MovieSpider, Page, ParseOutput, PendingMovieContext, RATING_NOT_FOUND};

impl MovieSpider {
    /// Completes a movie record from its rating page
    ///
    /// The rating is the first non-blank text directly inside a `span` of the
    /// aggregate-rating score block; [`RATING_NOT_FOUND`] when there is none.
    /// Always produces exactly one record and no tasks.
    pub fn parse_rating(&self, page: &Page, context: PendingMovieContext) -> ParseOutput {
        let document = page.document();

        let rating = document
            .select(&self.selectors.rating_score)
            .flat_map(|span| span.children())
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string);

        if rating.is_none() {
            tracing::debug!("No aggregate rating on {} for '{}'", page.url, context.title);
        }

        let mut output = ParseOutput::new();
        output.add_item(context.into_record(rating.unwrap_or_else(|| RATING_NOT_FOUND.to_string())));
        output
    }
}
