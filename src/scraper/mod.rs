mod extract;
mod images;
mod models;
mod pager;
mod parse;
mod scraper_error;

pub use extract::{extract_page, ImageSnapshot};
pub use images::HttpImageCapture;
pub use models::{LotRow, Page};
pub use pager::HttpPager;
pub use scraper_error::ScraperError;

/// Walks the remote listing one page at a time.
pub trait Pager {
    /// Rows of the page the cursor is on.
    fn current_page(&mut self) -> Result<Page, ScraperError>;

    /// Moves to the next page. `Ok(false)` means the traversal is complete.
    fn advance(&mut self) -> Result<bool, ScraperError>;
}

/// Stores the thumbnail of a lot under a freshly minted image reference.
pub trait ImageCapture {
    fn capture(&mut self, image_ref: &str, lot_id: i64, row: &LotRow) -> Result<(), ScraperError>;
}
