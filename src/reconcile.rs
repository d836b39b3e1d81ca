// src/reconcile.rs

use crate::db::lots;
use crate::db::Database;
use crate::domain::changes::{ChangeEvent, EventKind};
use crate::domain::lot::LotRecord;
use crate::errors::MirrorError;
use crate::scraper::{extract_page, ImageCapture, ImageSnapshot, Pager, ScraperError};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Traversing,
    ReconcilingRemovals,
    Done,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub lots_seen: usize,
    pub images_captured: usize,
    pub new: usize,
    pub updated: usize,
    pub removed: usize,
}

impl RunSummary {
    pub fn has_changes(&self) -> bool {
        self.new + self.updated + self.removed > 0
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    /// New/Updated in traversal order, then Removed in ascending id order.
    pub events: Vec<ChangeEvent>,
    pub summary: RunSummary,
}

/// Mirrors the remote listing into the `lots` table in one full pass.
///
/// The set of stored ids is captured before the first page; anything in it
/// that the traversal never sees is removed afterwards. Each mutation is
/// committed as it happens, so an interrupted run leaves every earlier lot
/// applied and the rest untouched.
pub struct Reconciler<'a> {
    db: &'a Database,
    phase: RunPhase,
    seen: HashSet<i64>,
    events: Vec<ChangeEvent>,
    summary: RunSummary,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            phase: RunPhase::Traversing,
            seen: HashSet::new(),
            events: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn run(
        &mut self,
        pager: &mut dyn Pager,
        capture: &mut dyn ImageCapture,
    ) -> Result<RunOutcome, MirrorError> {
        self.phase = RunPhase::Traversing;
        self.seen.clear();
        self.events.clear();
        self.summary = RunSummary::default();

        let previously_known = self.db.with_conn(|conn| lots::list_lot_ids(conn))?;
        info!(stored = previously_known.len(), "starting traversal");

        self.traverse(pager, capture)?;

        self.phase = RunPhase::ReconcilingRemovals;
        self.remove_unseen(&previously_known)?;

        self.phase = RunPhase::Done;
        info!(
            pages = self.summary.pages,
            lots_seen = self.summary.lots_seen,
            images_captured = self.summary.images_captured,
            new = self.summary.new,
            updated = self.summary.updated,
            removed = self.summary.removed,
            "run complete"
        );

        Ok(RunOutcome {
            events: std::mem::take(&mut self.events),
            summary: std::mem::take(&mut self.summary),
        })
    }

    fn traverse(
        &mut self,
        pager: &mut dyn Pager,
        capture: &mut dyn ImageCapture,
    ) -> Result<(), MirrorError> {
        let mut images = ImageSnapshot::new(self.db.with_conn(|conn| lots::load_image_refs(conn))?);

        loop {
            let page = pager.current_page()?;
            self.summary.pages += 1;

            let extracted = extract_page(&page, &images, capture, Utc::now().naive_utc())?;
            debug!(page = page.number, lots = extracted.len(), "extracted page");

            for candidate in extracted {
                if candidate.captured {
                    self.summary.images_captured += 1;
                    images.remember(candidate.lot.id, candidate.lot.image_ref.clone());
                }
                self.apply(candidate.lot)?;
            }

            match pager.advance() {
                Ok(true) => {}
                Ok(false) => break,
                // Stopping here would remove every stored lot past the ceiling.
                Err(ScraperError::PageLimit(limit)) => {
                    return Err(MirrorError::IncompleteTraversal(limit));
                }
                Err(e) => {
                    warn!(page = page.number, error = %e, "cannot advance, ending traversal");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Classifies one extracted lot against its stored version and applies
    /// the resulting mutation, if any.
    fn apply(&mut self, lot: LotRecord) -> Result<(), MirrorError> {
        self.seen.insert(lot.id);
        self.summary.lots_seen += 1;

        let stored = self.db.with_conn(|conn| lots::get_lot(conn, lot.id))?;

        match stored {
            None => {
                self.db.with_conn(|conn| lots::insert_lot(conn, &lot))?;
                debug!(lot_id = lot.id, "new lot");
                self.record(ChangeEvent::new_lot(lot));
            }
            Some(old) => {
                let changes = old.diff(&lot);
                if !changes.is_empty() {
                    self.db.with_conn(|conn| lots::replace_lot(conn, &lot))?;
                    debug!(
                        lot_id = lot.id,
                        fields = ?changes.iter().map(|c| c.field_name.as_str()).collect::<Vec<_>>(),
                        "updated lot"
                    );
                    self.record(ChangeEvent::updated(lot, changes));
                } else if old.image_ref.is_empty() && !lot.image_ref.is_empty() {
                    // A capture that failed on an earlier run has now succeeded.
                    self.db.with_conn(|conn| lots::replace_lot(conn, &lot))?;
                    debug!(lot_id = lot.id, image_ref = %lot.image_ref, "backfilled image");
                }
            }
        }
        Ok(())
    }

    fn remove_unseen(&mut self, previously_known: &HashSet<i64>) -> Result<(), MirrorError> {
        let mut removed: Vec<i64> = previously_known.difference(&self.seen).copied().collect();
        removed.sort_unstable();

        for id in removed {
            let stored = self.db.with_conn(|conn| lots::get_lot(conn, id))?;
            if let Some(old) = stored {
                debug!(lot_id = id, "removed lot");
                self.record(ChangeEvent::removed(old));
            }
            self.db.with_conn(|conn| lots::delete_lot(conn, id))?;
        }
        Ok(())
    }

    fn record(&mut self, event: ChangeEvent) {
        match event.kind {
            EventKind::New => self.summary.new += 1,
            EventKind::Updated => self.summary.updated += 1,
            EventKind::Removed => self.summary.removed += 1,
        }
        self.events.push(event);
    }
}
