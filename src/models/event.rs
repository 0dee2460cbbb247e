use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Itinerary event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventCategory {
    Activity,
    Transport,
    Accommodation,
    Food,
    Sightseeing,
    Other,
}

impl EventCategory {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "ACTIVITY" => Ok(EventCategory::Activity),
            "TRANSPORT" => Ok(EventCategory::Transport),
            "ACCOMMODATION" => Ok(EventCategory::Accommodation),
            "FOOD" => Ok(EventCategory::Food),
            "SIGHTSEEING" => Ok(EventCategory::Sightseeing),
            "OTHER" => Ok(EventCategory::Other),
            _ => Err(format!("Invalid event category: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Activity => "ACTIVITY",
            EventCategory::Transport => "TRANSPORT",
            EventCategory::Accommodation => "ACCOMMODATION",
            EventCategory::Food => "FOOD",
            EventCategory::Sightseeing => "SIGHTSEEING",
            EventCategory::Other => "OTHER",
        }
    }
}

/// Event model: one entry of a trip's itinerary
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub category: String, // Stored as TEXT, use EventCategory enum for type safety
    pub cost: Option<Decimal>,
    pub currency: String,
    pub order_index: i32,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Event {
    /// Get category as an enum
    pub fn category_enum(&self) -> EventCategory {
        EventCategory::from_str(&self.category).unwrap_or(EventCategory::Other)
    }

    /// "09:30 - 11:00", "09:30" or empty, for listings and exports
    pub fn time_range_label(&self) -> String {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
            }
            (Some(start), None) => start.format("%H:%M").to_string(),
            _ => String::new(),
        }
    }
}

/// One position change inside a reorder request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPosition {
    pub id: Uuid,
    pub order_index: i32,
    pub date: Option<NaiveDate>,
}

/// Body of `POST /api/trips/{id}/events`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub category: Option<EventCategory>,
    pub cost: Option<Decimal>,
    pub currency: Option<String>,
}

impl Validate for CreateEvent {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("title", &self.title, 200)
            .max_len("description", self.description.as_deref(), 5000)
            .max_len("location", self.location.as_deref(), 300)
            .non_negative("cost", self.cost)
            .money("cost", self.cost)
            .currency("currency", self.currency.as_deref());
        check_time_order(&mut v, self.start_time, self.end_time);
        v.finish()
    }
}

/// Body of `PATCH /api/trips/{id}/events/{eventId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub category: Option<EventCategory>,
    pub cost: Option<Decimal>,
    pub currency: Option<String>,
}

impl UpdateEvent {
    pub fn validate_against(&self, current: &Event) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("title", self.title.as_deref(), 200)
            .max_len("description", self.description.as_deref(), 5000)
            .max_len("location", self.location.as_deref(), 300)
            .non_negative("cost", self.cost)
            .money("cost", self.cost)
            .currency("currency", self.currency.as_deref());
        check_time_order(
            &mut v,
            self.start_time.or(current.start_time),
            self.end_time.or(current.end_time),
        );
        v.finish()
    }
}

fn check_time_order(v: &mut Validator, start: Option<NaiveTime>, end: Option<NaiveTime>) {
    if let (Some(start), Some(end)) = (start, end) {
        v.check(end >= start, "endTime", "End time must be on or after start time");
    }
}

/// Body of `POST /api/trips/{id}/events/reorder`
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderEvents {
    pub items: Vec<EventPosition>,
}

impl Validate for ReorderEvents {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.check(!self.items.is_empty(), "items", "At least one item is required")
            .check(self.items.len() <= 500, "items", "At most 500 items per request")
            .check(
                self.items.iter().all(|item| item.order_index >= 0),
                "items",
                "orderIndex must not be negative",
            );
        let mut ids: Vec<Uuid> = self.items.iter().map(|item| item.id).collect();
        ids.sort();
        ids.dedup();
        v.check(ids.len() == self.items.len(), "items", "Duplicate event ids");
        v.finish()
    }
}
