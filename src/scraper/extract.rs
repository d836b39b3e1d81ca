use crate::domain::lot::LotRecord;
use crate::errors::MirrorError;
use crate::scraper::models::{LotRow, Page};
use crate::scraper::parse;
use crate::scraper::ImageCapture;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Rows shorter than this are headers or spacers, not lots.
const MIN_LOT_CELLS: usize = 5;

const DESCRIPTION_CELL: usize = 1;
const ODOMETER_CELL: usize = 2;
const CONDITION_CELL: usize = 3;
const SALE_CELL: usize = 4;
const BID_CELL: usize = 5;

/// The image references already stored, loaded once per run and extended as
/// new references are captured.
#[derive(Debug, Clone, Default)]
pub struct ImageSnapshot {
    refs: HashMap<i64, String>,
}

impl ImageSnapshot {
    pub fn new(refs: HashMap<i64, String>) -> Self {
        Self { refs }
    }

    /// Records a reference assigned during the current run.
    pub fn remember(&mut self, lot_id: i64, image_ref: String) {
        if !image_ref.is_empty() {
            self.refs.insert(lot_id, image_ref);
        }
    }

    pub fn get(&self, lot_id: i64) -> Option<&str> {
        self.refs
            .get(&lot_id)
            .map(String::as_str)
            .filter(|r| !r.is_empty())
    }
}

/// A candidate record plus whether its image was captured for it just now.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub lot: LotRecord,
    pub captured: bool,
}

fn new_image_ref() -> String {
    format!("{}.png", Uuid::new_v4())
}

/// Turns one page of rows into candidate lot records.
///
/// Stored image references are reused; a lot without one gets a fresh
/// reference and exactly one capture. A failed capture leaves the reference
/// empty so a later run tries again. A row without a lot number aborts the
/// whole page with `MalformedRow`.
pub fn extract_page(
    page: &Page,
    images: &ImageSnapshot,
    capture: &mut dyn ImageCapture,
    now: NaiveDateTime,
) -> Result<Vec<Extracted>, MirrorError> {
    let mut assigned: HashMap<i64, String> = HashMap::new();
    let mut out = Vec::with_capacity(page.rows.len());

    for (index, row) in page.rows.iter().enumerate() {
        if row.cells.len() < MIN_LOT_CELLS {
            debug!(page = page.number, row = index, cells = row.cells.len(), "skipping short row");
            continue;
        }

        let mut lot = parse_row(row, now)?;

        let mut captured = false;
        if let Some(existing) = images.get(lot.id) {
            lot.image_ref = existing.to_string();
        } else if let Some(existing) = assigned.get(&lot.id) {
            lot.image_ref = existing.clone();
        } else {
            let image_ref = new_image_ref();
            match capture.capture(&image_ref, lot.id, row) {
                Ok(()) => {
                    debug!(lot_id = lot.id, image_ref = %image_ref, "captured image");
                    assigned.insert(lot.id, image_ref.clone());
                    lot.image_ref = image_ref;
                    captured = true;
                }
                Err(e) => {
                    warn!(lot_id = lot.id, error = %e, "image capture skipped");
                }
            }
        }

        out.push(Extracted { lot, captured });
    }

    Ok(out)
}

/// Parses every column of a lot row except the image reference.
fn parse_row(row: &LotRow, now: NaiveDateTime) -> Result<LotRecord, MirrorError> {
    let description = row.cell(DESCRIPTION_CELL).unwrap_or_default();
    let id = parse::parse_lot_id(description).ok_or_else(|| {
        MirrorError::MalformedRow(format!("no lot number in {description:?}"))
    })?;

    let odometer = row.cell(ODOMETER_CELL).map(parse::parse_odometer).unwrap_or_default();
    let condition = row
        .cell(CONDITION_CELL)
        .map(parse::parse_condition)
        .unwrap_or_default();
    let (auction, scheduled_start) = row
        .cell(SALE_CELL)
        .map(|c| parse::parse_auction(c, now))
        .unwrap_or_default();
    let (current_bid, buy_now) = row.cell(BID_CELL).map(parse::parse_bids).unwrap_or_default();

    Ok(LotRecord {
        id,
        image_ref: String::new(),
        source_url: row.link.clone().unwrap_or_default(),
        name: parse::parse_name(description),
        odometer,
        condition,
        auction,
        scheduled_start,
        last_observed_at: now,
        current_bid,
        buy_now,
    })
}
