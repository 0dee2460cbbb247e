//! Printable trip itinerary.

use super::pdf::{Font, PdfDocument};
use crate::models::{Budget, Event, Trip};
use chrono::NaiveDate;
use rust_decimal::Decimal;

const MAX_FILENAME_LEN: usize = 60;

/// Everything that goes into an itinerary export
pub struct ItineraryExport<'a> {
    pub trip: &'a Trip,
    pub events: &'a [Event],
    pub expense_total: Decimal,
    pub budget: Option<&'a Budget>,
}

/// Lowercase ASCII alphanumerics; every other run becomes one `-`
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.len() > MAX_FILENAME_LEN {
        out.truncate(MAX_FILENAME_LEN);
        while out.ends_with('-') {
            out.pop();
        }
    }
    if out.is_empty() {
        out.push_str("trip");
    }
    out
}

pub fn itinerary_filename(title: &str) -> String {
    format!("{}-itinerary.pdf", sanitize_filename(title))
}

pub fn content_disposition(title: &str) -> String {
    format!("attachment; filename=\"{}\"", itinerary_filename(title))
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    let fmt = |d: NaiveDate| d.format("%b %-d, %Y").to_string();
    match (start, end) {
        (Some(s), Some(e)) if s == e => Some(fmt(s)),
        (Some(s), Some(e)) => Some(format!("{} - {}", fmt(s), fmt(e))),
        (Some(s), None) => Some(format!("From {}", fmt(s))),
        (None, Some(e)) => Some(format!("Until {}", fmt(e))),
        (None, None) => None,
    }
}

/// Lay out the itinerary grouped by day, followed by spending
pub fn render(export: &ItineraryExport<'_>) -> Vec<u8> {
    let trip = export.trip;
    let mut doc = PdfDocument::new(trip.title.as_str());

    doc.text(&trip.title, 22.0, Font::Bold);
    if let Some(destination) = trip.destination.as_deref().filter(|d| !d.is_empty()) {
        doc.text(destination, 13.0, Font::Regular);
    }
    if let Some(range) = date_range(trip.start_date, trip.end_date) {
        doc.text(&range, 11.0, Font::Regular);
    }
    if let Some(description) = trip.description.as_deref().filter(|d| !d.is_empty()) {
        doc.space(6.0).text(description, 10.0, Font::Regular);
    }

    doc.space(8.0).heading("Itinerary", 16.0);
    if export.events.is_empty() {
        doc.text("No events planned yet.", 10.0, Font::Regular);
    }

    let mut current_day: Option<NaiveDate> = None;
    for event in export.events {
        if current_day != Some(event.date) {
            current_day = Some(event.date);
            doc.heading(&event.date.format("%A, %B %-d, %Y").to_string(), 12.0);
        }

        let times = event.time_range_label();
        let line = if times.is_empty() {
            event.title.clone()
        } else {
            format!("{}  {}", times, event.title)
        };
        doc.indented(&line, 10.5, Font::Bold, 10.0);

        let mut details = Vec::new();
        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            details.push(location.to_string());
        }
        if let Some(cost) = event.cost {
            details.push(format!("{} {}", cost, event.currency));
        }
        if !details.is_empty() {
            doc.indented(&details.join(" | "), 9.5, Font::Regular, 20.0);
        }
        if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
            doc.indented(description, 9.5, Font::Regular, 20.0);
        }
    }

    doc.space(8.0).heading("Budget", 16.0);
    match export.budget {
        Some(budget) => {
            let remaining = budget.total - export.expense_total;
            doc.text(
                &format!("Budget: {} {}", budget.total, budget.currency),
                10.5,
                Font::Regular,
            )
            .text(
                &format!("Spent: {} {}", export.expense_total, budget.currency),
                10.5,
                Font::Regular,
            )
            .text(
                &format!("Remaining: {} {}", remaining, budget.currency),
                10.5,
                Font::Regular,
            );
        }
        None => {
            doc.text(
                &format!("Total expenses: {}", export.expense_total),
                10.5,
                Font::Regular,
            );
        }
    }

    doc.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use uuid::Uuid;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("Summer in Lisbon!"), "summer-in-lisbon");
        assert_eq!(sanitize_filename("  --Tokyo & Kyoto 2025--"), "tokyo-kyoto-2025");
        assert_eq!(sanitize_filename("日本"), "trip");
        assert_eq!(sanitize_filename(""), "trip");
        assert_eq!(sanitize_filename(&"a".repeat(80)).len(), 60);
    }

    #[test]
    fn disposition_names_the_itinerary() {
        assert_eq!(
            content_disposition("Road Trip"),
            "attachment; filename=\"road-trip-itinerary.pdf\""
        );
    }

    #[test]
    fn date_ranges_read_naturally() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 7, day);
        assert_eq!(date_range(d(1), d(1)).as_deref(), Some("Jul 1, 2025"));
        assert_eq!(
            date_range(d(1), d(9)).as_deref(),
            Some("Jul 1, 2025 - Jul 9, 2025")
        );
        assert_eq!(date_range(None, None), None);
    }

    #[test]
    fn render_produces_a_pdf() {
        let now = Utc::now().naive_utc();
        let trip = Trip {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Porto (long weekend)".into(),
            description: None,
            destination: Some("Porto".into()),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 3),
            cover_image_url: None,
            tags: vec![],
            is_archived: false,
            archived_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let event = Event {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            title: "Port tasting".into(),
            description: None,
            location: Some("Vila Nova de Gaia".into()),
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(17, 0, 0),
            end_time: None,
            category: "FOOD".into(),
            cost: Some(Decimal::new(2500, 2)),
            currency: "EUR".into(),
            order_index: 0,
            created_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let events = [event];
        let bytes = render(&ItineraryExport {
            trip: &trip,
            events: &events,
            expense_total: Decimal::new(2500, 2),
            budget: None,
        });

        assert!(bytes.starts_with(b"%PDF-1.4"));
        let needle = b"Porto \\(long weekend\\)";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }
}
