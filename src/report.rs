// Writes the per-run change report to disk.

use crate::domain::changes::ChangeEvent;
use crate::errors::MirrorError;
use crate::templates::change_report;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// `file://` URL of the image directory, with a trailing slash, so report
/// pages can reference images no matter where the report directory lives.
pub fn image_base_url(image_dir: &Path) -> Result<String, MirrorError> {
    let abs = fs::canonicalize(image_dir)?;
    Url::from_directory_path(&abs)
        .map(|u| u.to_string())
        .map_err(|_| MirrorError::Config(format!("image_dir {} is not a local path", abs.display())))
}

/// Renders `events` into `<report_dir>/<YYYY_MM_DD_HH_MM_SS>.html`.
pub fn write_html_report(
    report_dir: &Path,
    events: &[ChangeEvent],
    image_base: &str,
    generated_at: NaiveDateTime,
) -> Result<PathBuf, MirrorError> {
    let path = report_dir.join(format!("{}.html", generated_at.format("%Y_%m_%d_%H_%M_%S")));
    let markup = change_report(events, image_base, generated_at);
    fs::write(&path, markup.into_string())?;
    Ok(path)
}

pub fn events_json(events: &[ChangeEvent]) -> Result<String, MirrorError> {
    serde_json::to_string_pretty(events).map_err(|e| MirrorError::Serialize(e.to_string()))
}
