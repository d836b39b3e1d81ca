use thiserror::Error;

/// Failures of the page and image collaborators.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Blocked by site: {0}")]
    Blocked(String),
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    #[error("Row has no image source for lot {0}")]
    MissingImage(i64),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    /// The page ceiling was hit while the listing still had a next page.
    #[error("Page limit of {0} reached before the last page")]
    PageLimit(usize),
}
