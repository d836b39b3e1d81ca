// src/domain/changes.rs

use crate::domain::lot::{FieldChange, LotRecord};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    New,
    Updated,
    Removed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::New => write!(f, "New"),
            EventKind::Updated => write!(f, "Updated"),
            EventKind::Removed => write!(f, "Removed"),
        }
    }
}

/// One entry of a run's change log.
///
/// `lot` is the freshly extracted record for New/Updated and the last stored
/// record for Removed. `changes` is only populated for Updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub kind: EventKind,
    pub lot: LotRecord,
    pub changes: Vec<FieldChange>,
}

impl ChangeEvent {
    pub fn new_lot(lot: LotRecord) -> Self {
        Self {
            kind: EventKind::New,
            lot,
            changes: Vec::new(),
        }
    }

    pub fn updated(lot: LotRecord, changes: Vec<FieldChange>) -> Self {
        Self {
            kind: EventKind::Updated,
            lot,
            changes,
        }
    }

    pub fn removed(lot: LotRecord) -> Self {
        Self {
            kind: EventKind::Removed,
            lot,
            changes: Vec::new(),
        }
    }
}
