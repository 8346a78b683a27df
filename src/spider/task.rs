//! Follow-up fetch descriptions and parser output

use crate::spider::record::{MovieRecord, PendingMovieContext};
use crate::url::normalize_url;
use url::Url;

/// Which parser handles a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// A category listing; `page_number` starts at 1 for the seed
    Category { page_number: u32 },

    /// A movie article
    Movie,

    /// A rating page; owns the fields extracted from the movie article
    Rating(PendingMovieContext),
}

impl Continuation {
    /// Short name used in logs, statistics and dedup keys
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Category { .. } => "category",
            Self::Movie => "movie",
            Self::Rating(_) => "rating",
        }
    }

    /// Queue priority (lower is served first)
    ///
    /// Rating pages finish a chain that already holds extracted data, so they
    /// go ahead of new movie pages, which go ahead of further pagination.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Rating(_) => 0,
            Self::Movie => 1,
            Self::Category { .. } => 2,
        }
    }
}

/// A page to fetch and the parser to run on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub target: Url,
    pub continuation: Continuation,
}

impl Task {
    pub fn category(target: Url, page_number: u32) -> Self {
        Self {
            target,
            continuation: Continuation::Category { page_number },
        }
    }

    pub fn movie(target: Url) -> Self {
        Self {
            target,
            continuation: Continuation::Movie,
        }
    }

    pub fn rating(target: Url, context: PendingMovieContext) -> Self {
        Self {
            target,
            continuation: Continuation::Rating(context),
        }
    }

    /// Key identifying duplicate fetches
    ///
    /// Rating tasks return `None`: two movies may share a rating page and each
    /// carries its own context, so neither may be dropped.
    pub fn dedup_key(&self) -> Option<String> {
        if matches!(self.continuation, Continuation::Rating(_)) {
            return None;
        }

        let url = normalize_url(self.target.as_str())
            .map(|u| u.to_string())
            .unwrap_or_else(|_| self.target.to_string());

        Some(format!("{}:{}", self.continuation.kind(), url))
    }
}

/// Records and follow-up tasks produced by parsing one page
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseOutput {
    pub items: Vec<MovieRecord>,
    pub requests: Vec<Task>,
}

impl ParseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: MovieRecord) {
        self.items.push(item);
    }

    pub fn add_request(&mut self, request: Task) {
        self.requests.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.requests.is_empty()
    }
}
