use crate::domain::changes::{ChangeEvent, EventKind};
use crate::templates::layout::report_layout;
use chrono::NaiveDateTime;
use maud::{html, Markup};

const REPORT_TITLE: &str = "Auction Lot Updates";
const IMAGE_HEIGHT: u32 = 116;

fn event_class(kind: EventKind) -> &'static str {
    match kind {
        EventKind::New => "event-new",
        EventKind::Updated => "event-updated",
        EventKind::Removed => "event-removed",
    }
}

fn event_row(event: &ChangeEvent, image_base: &str) -> Markup {
    let lot = &event.lot;
    html! {
        tr class=(event_class(event.kind)) {
            td {
                @if !lot.image_ref.is_empty() {
                    img src=(format!("{image_base}{}", lot.image_ref)) height=(IMAGE_HEIGHT) alt=(lot.name);
                }
            }
            td {
                (lot.name)
                @if !event.changes.is_empty() {
                    ul class="changes" {
                        @for change in &event.changes {
                            li { (change.field_name) ": " (change.previous_value) " → " (change.current_value) }
                        }
                    }
                }
            }
            td { (lot.condition.to_string()) }
            td { (lot.current_bid) }
            td { (lot.buy_now) }
            td {
                @if let Some(start) = lot.scheduled_start {
                    (start.format("%Y-%m-%d %H:%M").to_string())
                }
            }
            td { (lot.auction) }
            td {
                @if !lot.source_url.is_empty() {
                    a href=(lot.source_url) { "View" }
                }
            }
            td class="event" { (event.kind.to_string()) }
        }
    }
}

/// Full HTML page listing every change event of a run.
///
/// `image_base` is prepended to each image reference, so it should end
/// with a path separator.
pub fn change_report(events: &[ChangeEvent], image_base: &str, generated_at: NaiveDateTime) -> Markup {
    let content = html! {
        p { "Generated " (generated_at.format("%Y-%m-%d %H:%M:%S").to_string()) ", " (events.len()) " change(s)." }
        table {
            thead {
                tr {
                    th { "Image" } th { "Name" } th { "Conditions" }
                    th { "Bid" } th { "Buy Now" } th { "Date" }
                    th { "Auction" } th { "URL" } th { "Event" }
                }
            }
            tbody {
                @for event in events {
                    (event_row(event, image_base))
                }
            }
        }
    };
    report_layout(REPORT_TITLE, content)
}
