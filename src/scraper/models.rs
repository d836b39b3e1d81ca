/// One listing row as handed over by the page collaborator.
///
/// `cells` holds the visible text of each table cell, one rendered line per
/// `\n`. Column meaning is resolved by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotRow {
    pub cells: Vec<String>,
    /// Detail page link found in the image cell.
    pub link: Option<String>,
    /// Thumbnail source found in the image cell.
    pub image_src: Option<String>,
}

impl LotRow {
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// The rows of the page the pager is currently positioned on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub rows: Vec<LotRow>,
}
