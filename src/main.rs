use crate::db::{init_db, Database};
use crate::reconcile::Reconciler;
use crate::scraper::{HttpImageCapture, HttpPager};
use crate::settings::Settings;
use anyhow::Context;
use chrono::Local;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

mod db;
mod domain;
mod errors;
mod reconcile;
mod report;
mod scraper;
mod settings;
mod telemetry;
mod templates;

#[cfg(test)]
mod tests;

/// Mirror an auction lot listing into SQLite and report what changed.
#[derive(Debug, Parser)]
#[command(name = "lot_mirror", version)]
struct Cli {
    /// Settings file (TOML). Defaults to config/default.toml when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the change events as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Skip writing the HTML report.
    #[arg(long)]
    no_report: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_telemetry();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("mirror run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    fs::create_dir_all(&settings.storage.image_dir).context("creating image directory")?;
    fs::create_dir_all(&settings.storage.report_dir).context("creating report directory")?;

    let db = Database::open(&settings.database.path)?;
    init_db(&db)?;

    let mut pager = HttpPager::new(&settings.source)?;
    let mut capture = HttpImageCapture::new(&settings.source, &settings.storage.image_dir)?;

    let mut reconciler = Reconciler::new(&db);
    let outcome = reconciler
        .run(&mut pager, &mut capture)
        .with_context(|| format!("run stopped while {:?}", reconciler.phase()))?;

    if !outcome.summary.has_changes() {
        info!("no changes since last run");
    } else if !cli.no_report {
        let image_base = report::image_base_url(&settings.storage.image_dir)?;
        let path = report::write_html_report(
            &settings.storage.report_dir,
            &outcome.events,
            &image_base,
            Local::now().naive_local(),
        )?;
        info!(path = %path.display(), events = outcome.events.len(), "report written");
    }

    if cli.json {
        println!("{}", report::events_json(&outcome.events)?);
    }

    Ok(())
}
