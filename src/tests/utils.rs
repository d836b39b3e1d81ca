use crate::db::{init_db, Database};
use crate::domain::lot::{ConditionTriple, LotRecord};
use crate::scraper::{ImageCapture, LotRow, Page, Pager, ScraperError};
use chrono::NaiveDate;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fresh in-memory database with the production schema.
pub fn make_db() -> Database {
    let db = Database::open_in_memory().unwrap_or_else(|e| panic!("open failed: {e}"));
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

/// Serves a fixed list of pages in order.
pub struct ScriptedPager {
    pages: Vec<Vec<LotRow>>,
    index: usize,
    /// `advance` fails when called on this 0-based page index.
    pub fail_advance_on: Option<usize>,
    pub fail_current: bool,
}

impl ScriptedPager {
    pub fn new(pages: Vec<Vec<LotRow>>) -> Self {
        Self {
            pages,
            index: 0,
            fail_advance_on: None,
            fail_current: false,
        }
    }
}

impl Pager for ScriptedPager {
    fn current_page(&mut self) -> Result<Page, ScraperError> {
        if self.fail_current {
            return Err(ScraperError::Network("connection refused".into()));
        }
        Ok(Page {
            number: self.index + 1,
            rows: self.pages.get(self.index).cloned().unwrap_or_default(),
        })
    }

    fn advance(&mut self) -> Result<bool, ScraperError> {
        if self.fail_advance_on == Some(self.index) {
            return Err(ScraperError::Network("next page timed out".into()));
        }
        if self.index + 1 < self.pages.len() {
            self.index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Records every capture request; optionally fails them all.
#[derive(Default)]
pub struct RecordingCapture {
    pub captured: Vec<i64>,
    pub fail: bool,
}

impl ImageCapture for RecordingCapture {
    fn capture(&mut self, _image_ref: &str, lot_id: i64, _row: &LotRow) -> Result<(), ScraperError> {
        if self.fail {
            return Err(ScraperError::Network("image host down".into()));
        }
        self.captured.push(lot_id);
        Ok(())
    }
}

pub const NAME: &str = "2012 MAZDA MX-5";
pub const ODOMETER: &str = "84,112 mi";

/// A results row as the pager would hand it over.
pub fn lot_row(id: i64, bid: &str) -> LotRow {
    lot_row_at(id, bid, "CA - SACRAMENTO\nLive Now")
}

pub fn lot_row_at(id: i64, bid: &str, sale: &str) -> LotRow {
    LotRow {
        cells: vec![
            String::new(),
            format!("{NAME}\nLot #{id}"),
            format!("Odometer\n{ODOMETER}"),
            "CLEAR\nFRONT END\nMINOR DENT".to_string(),
            sale.to_string(),
            format!("Current bid\n{bid}"),
        ],
        link: Some(format!("https://example.test/lot/{id}")),
        image_src: Some(format!("https://img.example.test/{id}.jpg")),
    }
}

/// The stored form of `lot_row(id, bid)`.
pub fn stored_lot(id: i64, bid: &str, image_ref: &str) -> LotRecord {
    LotRecord {
        id,
        image_ref: image_ref.to_string(),
        source_url: format!("https://example.test/lot/{id}"),
        name: NAME.to_string(),
        odometer: ODOMETER.to_string(),
        condition: ConditionTriple::new("CLEAR", "FRONT END", "MINOR DENT"),
        auction: "CA - SACRAMENTO".to_string(),
        scheduled_start: None,
        last_observed_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default(),
        current_bid: bid.to_string(),
        buy_now: String::new(),
    }
}

/// A search results page with one lot row per id, in the site's table layout.
pub fn results_page(ids: &[i64], next_enabled: bool) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr>
                  <td><a href="/lot/{id}"><img src="/thumbs/{id}.jpg"></a></td>
                  <td><span>{NAME}</span><span>Lot #{id}</span></td>
                  <td><span>Odometer</span><span>{ODOMETER}</span></td>
                  <td><span>CLEAR</span><span>FRONT END</span><span>MINOR DENT</span></td>
                  <td><span>CA - SACRAMENTO</span><span>Live Now</span></td>
                  <td><span>Current bid</span><span>$500</span></td>
                </tr>"#
            )
        })
        .collect();

    let next_class = if next_enabled {
        "p-paginator-next"
    } else {
        "p-paginator-next p-disabled"
    };

    format!(
        r#"<html><body>
        <table id="serverSideDataTable-table"><tbody>{rows}</tbody></table>
        <button class="{next_class}">Next</button>
        </body></html>"#
    )
}

/// A 200 response carrying `body`.
pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body)
}

/// A `wiremock` server driven from synchronous tests. The server runs on its
/// own thread, so the blocking clients under test call it directly.
pub struct StubServer {
    server: MockServer,
    runtime: Runtime,
}

impl StubServer {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Mocks match in the order they are mounted.
    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Request paths (with query) in the order they arrived.
    pub fn requests(&self) -> Vec<String> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| match r.url.query() {
                Some(q) => format!("{}?{q}", r.url.path()),
                None => r.url.path().to_string(),
            })
            .collect()
    }
}
