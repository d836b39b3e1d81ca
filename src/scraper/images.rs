use crate::scraper::models::LotRow;
use crate::scraper::{ImageCapture, ScraperError};
use crate::settings::SourceSettings;
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Downloads a row's thumbnail into the image directory.
pub struct HttpImageCapture {
    client: Client,
    image_dir: PathBuf,
}

impl HttpImageCapture {
    pub fn new(settings: &SourceSettings, image_dir: impl Into<PathBuf>) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self {
            client,
            image_dir: image_dir.into(),
        })
    }
}

impl ImageCapture for HttpImageCapture {
    fn capture(&mut self, image_ref: &str, lot_id: i64, row: &LotRow) -> Result<(), ScraperError> {
        let src = row
            .image_src
            .as_deref()
            .ok_or(ScraperError::MissingImage(lot_id))?;

        let resp = self
            .client
            .get(src)
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Network(format!("image HTTP {status} for lot {lot_id}")));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        fs::write(self.image_dir.join(image_ref), &bytes)
            .map_err(|e| ScraperError::IoError(e.to_string()))?;

        Ok(())
    }
}
