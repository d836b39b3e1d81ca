use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::MirrorError;

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "LOT_MIRROR";

const DEFAULT_SEARCH_URL: &str = "https://www.copart.com/lotSearchResults?free=true&query=";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Application settings: built-in defaults, then a TOML file, then
/// `LOT_MIRROR__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub source: SourceSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

/// Where and how the listing is fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub search_url: String,
    /// Query parameter carrying the 1-based page number.
    pub page_param: String,
    /// Hard ceiling on pages per run.
    pub max_pages: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Pause between page requests.
    pub page_delay_ms: u64,
    pub max_attempts: u64,
    /// Optional JS-rendering proxy endpoint; its key comes from the environment.
    pub render_proxy_url: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            page_param: "page".to_string(),
            max_pages: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 60,
            page_delay_ms: 2000,
            max_attempts: 5,
            render_proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub image_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl Settings {
    /// Loads settings. `path` overrides the default `config/default.toml`,
    /// and unlike the default it must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, MirrorError> {
        let source = SourceSettings::default();

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder()
            .set_default("database.path", "lots.sqlite3")?
            .set_default("source.search_url", source.search_url)?
            .set_default("source.page_param", source.page_param)?
            .set_default("source.max_pages", source.max_pages as u64)?
            .set_default("source.user_agent", source.user_agent)?
            .set_default("source.timeout_secs", source.timeout_secs)?
            .set_default("source.page_delay_ms", source.page_delay_ms)?
            .set_default("source.max_attempts", source.max_attempts)?
            .set_default("storage.image_dir", "images")?
            .set_default("storage.report_dir", "reports")?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }
}
