// src/domain/lot.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// The three free-form condition lines shown for a lot
/// (title status, primary damage, secondary damage).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConditionTriple {
    pub title: String,
    pub condition1: String,
    pub condition2: String,
}

impl ConditionTriple {
    pub fn new(
        title: impl Into<String>,
        condition1: impl Into<String>,
        condition2: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            condition1: condition1.into(),
            condition2: condition2.into(),
        }
    }
}

impl fmt::Display for ConditionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.title, self.condition1, self.condition2)
    }
}

/// One mirrored auction lot, as extracted from a listing row or read back
/// from the `lots` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotRecord {
    pub id: i64,
    /// Assigned once per lot id and reused for as long as the lot is stored.
    pub image_ref: String,
    pub source_url: String,
    pub name: String,
    pub odometer: String,
    pub condition: ConditionTriple,
    pub auction: String,
    pub scheduled_start: Option<NaiveDateTime>,
    pub last_observed_at: NaiveDateTime,
    pub current_bid: String,
    pub buy_now: String,
}

/// A single differing change-detection field between a stored lot and a
/// freshly extracted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field_name: String,
    pub previous_value: String,
    pub current_value: String,
}

impl LotRecord {
    /// Compares the tracked fields of this (stored) lot with a newly extracted
    /// version. Only name, odometer, condition, current bid and buy-now price
    /// are tracked; url, auction, schedule, image and observation time churn
    /// freely without producing a change.
    pub fn diff(&self, new: &LotRecord) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        macro_rules! compare_and_log {
            ($field:ident, $field_name:expr) => {
                if self.$field != new.$field {
                    changes.push(FieldChange {
                        field_name: $field_name.to_string(),
                        previous_value: self.$field.to_string(),
                        current_value: new.$field.to_string(),
                    });
                }
            };
        }

        compare_and_log!(name, "name");
        compare_and_log!(odometer, "odometer");
        compare_and_log!(condition, "condition");
        compare_and_log!(current_bid, "current_bid");
        compare_and_log!(buy_now, "buy_now");

        changes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    pub(crate) fn sample_lot(id: i64) -> LotRecord {
        LotRecord {
            id,
            image_ref: format!("{id}.png"),
            source_url: format!("https://example.test/lot/{id}"),
            name: "2012 MAZDA MX-5 MIATA".to_string(),
            odometer: "84,112 mi (ACTUAL)".to_string(),
            condition: ConditionTriple::new("CLEAR", "FRONT END", "MINOR DENT"),
            auction: "CA - SACRAMENTO".to_string(),
            scheduled_start: Some(at(5, 10)),
            last_observed_at: at(1, 8),
            current_bid: "$500".to_string(),
            buy_now: String::new(),
        }
    }

    #[test]
    fn identical_lots_have_no_diff() {
        let lot = sample_lot(1001);
        assert!(lot.diff(&lot.clone()).is_empty());
    }

    #[test]
    fn untracked_fields_do_not_count_as_changes() {
        let before = sample_lot(1001);
        let after = LotRecord {
            image_ref: "other.png".to_string(),
            source_url: "https://example.test/moved".to_string(),
            auction: "NV - LAS VEGAS".to_string(),
            scheduled_start: None,
            last_observed_at: at(2, 9),
            ..before.clone()
        };

        assert!(before.diff(&after).is_empty());
    }

    #[test]
    fn bid_and_condition_changes_are_reported() {
        let before = sample_lot(1001);
        let after = LotRecord {
            current_bid: "$600".to_string(),
            condition: ConditionTriple::new("SALVAGE", "FRONT END", "MINOR DENT"),
            ..before.clone()
        };

        let changes = before.diff(&after);
        assert_eq!(changes.len(), 2);

        let bid = changes.iter().find(|c| c.field_name == "current_bid").unwrap();
        assert_eq!(bid.previous_value, "$500");
        assert_eq!(bid.current_value, "$600");

        let condition = changes.iter().find(|c| c.field_name == "condition").unwrap();
        assert_eq!(condition.previous_value, "CLEAR | FRONT END | MINOR DENT");
        assert_eq!(condition.current_value, "SALVAGE | FRONT END | MINOR DENT");
    }

    #[test]
    fn condition_equality_is_structural() {
        let a = ConditionTriple::new("CLEAR", "REAR END", "");
        let b = ConditionTriple::new("CLEAR", "REAR END", "");
        let c = ConditionTriple::new("CLEAR", "", "REAR END");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
