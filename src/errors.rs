// errors.rs
use thiserror::Error;

use crate::scraper::ScraperError;

/// Errors that stop a mirror run.
///
/// Parsing irregularities in optional columns never surface here; they
/// degrade to empty values inside the extractor.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A row had no parseable `#<digits>` lot number.
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    /// `insert_lot` was called for a lot id that is already stored.
    #[error("Duplicate lot id: {0}")]
    DuplicateKey(i64),

    /// The listing was not walked to its last page, so removals cannot be
    /// decided.
    #[error("Traversal stopped after {0} pages with more pages remaining")]
    IncompleteTraversal(usize),

    #[error("Driver unavailable: {0}")]
    DriverUnavailable(#[from] ScraperError),

    #[error("Database Error: {0}")]
    Db(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<config::ConfigError> for MirrorError {
    fn from(e: config::ConfigError) -> Self {
        MirrorError::Config(e.to_string())
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(e: std::io::Error) -> Self {
        MirrorError::Io(e.to_string())
    }
}
