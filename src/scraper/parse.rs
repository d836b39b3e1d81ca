// Column parsers for the lot search results table.
//
// Every parser here is best-effort: a missing or oddly shaped column yields
// empty strings (or no schedule), never an error. Only the lot number is
// mandatory and that check lives in the extractor.

use crate::domain::lot::ConditionTriple;
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const LIVE_NOW: &str = "Live Now";
const BUY_NOW: &str = "Buy Now";

fn lot_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\s*(\d+)").expect("lot number regex"))
}

fn countdown_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Auction in (\d+)D (\d+)H (\d+)min").expect("countdown regex"))
}

fn lines(cell: &str) -> Vec<&str> {
    cell.split('\n').map(str::trim).collect()
}

/// First `#<digits>` in the text. Digits that overflow an `i64` count as
/// unparseable.
pub fn parse_lot_id(text: &str) -> Option<i64> {
    lot_number_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First non-empty line of the description cell.
pub fn parse_name(cell: &str) -> String {
    cell.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// The first line is the column label; the reading follows it.
pub fn parse_odometer(cell: &str) -> String {
    let parts = lines(cell);
    if parts.len() > 1 {
        parts[1..].join(" ")
    } else {
        cell.trim().to_string()
    }
}

/// Last three lines, left-padded with empty strings when the cell is short.
pub fn parse_condition(cell: &str) -> ConditionTriple {
    let mut parts = lines(cell);
    while parts.len() < 3 {
        parts.insert(0, "");
    }
    let tail = &parts[parts.len() - 3..];
    ConditionTriple::new(tail[0], tail[1], tail[2])
}

/// Auction label and optional start time from the sale cell.
pub fn parse_auction(cell: &str, now: NaiveDateTime) -> (String, Option<NaiveDateTime>) {
    let parts = lines(cell);
    let label = parts.first().copied().unwrap_or_default().to_string();

    let schedule = if parts.len() > 1 {
        parse_schedule(parts[parts.len() - 1], now)
    } else {
        None
    };

    (label, schedule)
}

/// `Live Now` maps to `now`, `Auction in <d>D <h>H <m>min` to `now` plus the
/// countdown. Anything else has no schedule.
pub fn parse_schedule(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if text.contains(LIVE_NOW) {
        return Some(now);
    }

    let caps = countdown_re().captures(text)?;
    let days: u32 = caps[1].parse().ok()?;
    let hours: u32 = caps[2].parse().ok()?;
    let minutes: u32 = caps[3].parse().ok()?;

    let countdown = Duration::days(i64::from(days))
        + Duration::hours(i64::from(hours))
        + Duration::minutes(i64::from(minutes));
    now.checked_add_signed(countdown)
}

/// Current bid (second line) and buy-now price (last line, only when offered).
pub fn parse_bids(cell: &str) -> (String, String) {
    let parts = lines(cell);
    let current_bid = parts.get(1).copied().unwrap_or_default().to_string();
    let buy_now = if cell.contains(BUY_NOW) {
        parts.last().copied().unwrap_or_default().to_string()
    } else {
        String::new()
    };
    (current_bid, buy_now)
}
