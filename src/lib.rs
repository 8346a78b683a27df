//! Wiki-Movies: a movie catalogue crawler for wiki category listings
//!
//! This crate walks a paginated wiki category of movie articles, extracts
//! infobox metadata from every movie page, optionally follows the IMDb link
//! for an aggregate rating and writes one record per movie.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod robots;
pub mod spider;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Wiki-Movies operations
#[derive(Debug, Error)]
pub enum MovieError {
    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid selector '{css}': {message}")]
    Selector { css: String, message: String },

    #[error("No infobox title cell on {url}")]
    MissingTitle { url: String },

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use spider::{MovieRecord, MovieSpider, Page, ParseOutput, PendingMovieContext, Task};
pub use state::TaskState;
pub use url::{normalize_url, resolve_link};
