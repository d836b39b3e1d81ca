// pager.rs
use crate::scraper::models::{LotRow, Page};
use crate::scraper::{Pager, ScraperError};
use crate::settings::SourceSettings;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const ROW_SELECTOR: &str = r#"table[id$="-table"] tbody tr"#;
const NEXT_BUTTON_SELECTOR: &str = "button.p-paginator-next";
const DISABLED_CLASS: &str = "p-disabled";

const BACKOFF_STEP: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const JITTER_MAX_MS: u64 = 2000;

/// Env var holding the render proxy API key.
pub const RENDER_PROXY_KEY_VAR: &str = "RENDER_PROXY_API_KEY";

struct RenderProxy {
    endpoint: String,
    api_key: String,
}

/// Pages through the lot search results over plain HTTP, optionally through
/// a JS-rendering proxy.
pub struct HttpPager {
    client: Client,
    search_url: Url,
    page_param: String,
    max_pages: usize,
    max_attempts: u64,
    page_delay: Duration,
    backoff_step: Duration,
    jitter_max_ms: u64,
    render_proxy: Option<RenderProxy>,
    page: usize,
    html: Option<String>,
}

impl HttpPager {
    pub fn new(settings: &SourceSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let search_url = Url::parse(&settings.search_url)
            .map_err(|e| ScraperError::Config(format!("invalid search_url: {e}")))?;

        let render_proxy = match &settings.render_proxy_url {
            Some(endpoint) => {
                let api_key = std::env::var(RENDER_PROXY_KEY_VAR).map_err(|_| {
                    ScraperError::Config(format!("{RENDER_PROXY_KEY_VAR} environment variable not set"))
                })?;
                Some(RenderProxy {
                    endpoint: endpoint.clone(),
                    api_key,
                })
            }
            None => None,
        };

        Ok(Self {
            client,
            search_url,
            page_param: settings.page_param.clone(),
            max_pages: settings.max_pages,
            max_attempts: settings.max_attempts.max(1),
            page_delay: Duration::from_millis(settings.page_delay_ms),
            backoff_step: BACKOFF_STEP,
            jitter_max_ms: JITTER_MAX_MS,
            render_proxy,
            page: 1,
            html: None,
        })
    }

    fn page_url(&self, page: usize) -> Url {
        let mut url = self.search_url.clone();
        if page > 1 {
            url.query_pairs_mut()
                .append_pair(&self.page_param, &page.to_string());
        }
        url
    }

    fn load_current(&mut self) -> Result<&str, ScraperError> {
        if self.html.is_none() {
            let url = self.page_url(self.page);
            info!(page = self.page, url = %url, "fetching page");
            self.html = Some(self.fetch_html(url.as_str())?);
        }
        Ok(self.html.as_deref().unwrap_or_default())
    }

    fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            let start = std::time::Instant::now();

            match self.try_fetch_html(url) {
                Ok(html) => {
                    debug!(attempt, elapsed = ?start.elapsed(), "fetch succeeded");
                    return Ok(html);
                }
                Err(e) => {
                    warn!(attempt, elapsed = ?start.elapsed(), error = %e, "fetch failed");
                    last_err = Some(e);

                    if attempt < self.max_attempts {
                        let step = self.backoff_step.saturating_mul(attempt as u32);
                        let jitter = rand::thread_rng().gen_range(0..=self.jitter_max_ms);
                        std::thread::sleep(step.min(MAX_BACKOFF) + Duration::from_millis(jitter));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("fetch retry loop failed".into())))
    }

    fn try_fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let request = match &self.render_proxy {
            Some(proxy) => self.client.get(&proxy.endpoint).query(&[
                ("url", url),
                ("apikey", proxy.api_key.as_str()),
                ("js_render", "true"),
                ("original_status", "true"),
            ]),
            None => self.client.get(url),
        };

        let resp = request
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::Blocked(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status}")));
        }

        Ok(text)
    }
}

impl Pager for HttpPager {
    fn current_page(&mut self) -> Result<Page, ScraperError> {
        let base = self.page_url(self.page);
        let rows = parse_rows(self.load_current()?, &base)?;
        debug!(page = self.page, rows = rows.len(), "parsed page");
        Ok(Page {
            number: self.page,
            rows,
        })
    }

    fn advance(&mut self) -> Result<bool, ScraperError> {
        if !has_next_page(self.load_current()?)? {
            return Ok(false);
        }
        if self.page >= self.max_pages {
            warn!(max_pages = self.max_pages, "page limit reached with pages remaining");
            return Err(ScraperError::PageLimit(self.max_pages));
        }

        std::thread::sleep(self.page_delay);

        let next = self.page + 1;
        let url = self.page_url(next);
        info!(page = next, url = %url, "fetching page");
        let html = self.fetch_html(url.as_str())?;

        self.page = next;
        self.html = Some(html);
        Ok(true)
    }
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(e.to_string()))
}

/// Visible text of a cell: trimmed, non-empty text nodes, one per line.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extracts the result rows from a search results page. Links and image
/// sources are made absolute against `base`.
pub fn parse_rows(html: &str, base: &Url) -> Result<Vec<LotRow>, ScraperError> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_SELECTOR)?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;
    let img_sel = selector("img[src]")?;

    let mut rows = Vec::new();
    for tr in document.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = tr.select(&cell_sel).collect();

        let (link, image_src) = match cells.first() {
            Some(image_cell) => (
                image_cell
                    .select(&link_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| resolve(base, href)),
                image_cell
                    .select(&img_sel)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(|src| resolve(base, src)),
            ),
            None => (None, None),
        };

        rows.push(LotRow {
            cells: cells.into_iter().map(cell_text).collect(),
            link,
            image_src,
        });
    }

    Ok(rows)
}

/// True when the paginator shows an enabled "next" button.
pub fn has_next_page(html: &str) -> Result<bool, ScraperError> {
    let document = Html::parse_document(html);
    let next_sel = selector(NEXT_BUTTON_SELECTOR)?;

    Ok(match document.select(&next_sel).next() {
        Some(button) => {
            let el = button.value();
            let disabled =
                el.classes().any(|c| c == DISABLED_CLASS) || el.attr("disabled").is_some();
            !disabled
        }
        None => false,
    })
}
