use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 32;

/// Trip model: the top-level record owning events, expenses, budget, collaborators and messages
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub archived_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl Trip {
    /// Soft-deleted trips behave as if they do not exist
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Number of calendar days covered by the trip, when both dates are known
    pub fn duration_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

/// Listing filter over the archive flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatusFilter {
    #[default]
    Active,
    Archived,
    All,
}

impl TripStatusFilter {
    /// Value for the `is_archived` predicate; `None` means no filter
    pub fn archived_flag(&self) -> Option<bool> {
        match self {
            TripStatusFilter::Active => Some(false),
            TripStatusFilter::Archived => Some(true),
            TripStatusFilter::All => None,
        }
    }
}

/// Body of `POST /api/trips`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrip {
    pub title: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for CreateTrip {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("title", &self.title, 200)
            .max_len("description", self.description.as_deref(), 5000)
            .max_len("destination", self.destination.as_deref(), 200)
            .url("coverImageUrl", self.cover_image_url.as_deref());
        check_date_order(&mut v, self.start_date, self.end_date);
        check_tags(&mut v, &self.tags);
        v.finish()
    }
}

/// Body of `PATCH /api/trips/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrip {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_archived: Option<bool>,
}

impl UpdateTrip {
    /// Validate against the stored trip so a lone `endDate` cannot precede the existing start
    pub fn validate_against(&self, current: &Trip) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("title", self.title.as_deref(), 200)
            .max_len("description", self.description.as_deref(), 5000)
            .max_len("destination", self.destination.as_deref(), 200)
            .url("coverImageUrl", self.cover_image_url.as_deref());
        check_date_order(
            &mut v,
            self.start_date.or(current.start_date),
            self.end_date.or(current.end_date),
        );
        if let Some(tags) = &self.tags {
            check_tags(&mut v, tags);
        }
        v.finish()
    }
}

fn check_date_order(v: &mut Validator, start: Option<NaiveDate>, end: Option<NaiveDate>) {
    if let (Some(start), Some(end)) = (start, end) {
        v.check(end >= start, "endDate", "End date must be on or after start date");
    }
}

fn check_tags(v: &mut Validator, tags: &[String]) {
    v.check(
        tags.len() <= MAX_TAGS,
        "tags",
        format!("At most {} tags allowed", MAX_TAGS),
    );
    v.check(
        tags.iter()
            .all(|t| !t.trim().is_empty() && t.trim().chars().count() <= MAX_TAG_LEN),
        "tags",
        format!("Tags must be 1 to {} characters", MAX_TAG_LEN),
    );
}

/// Trim, lowercase and dedupe tags, keeping first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Trip {
        let now = chrono::Utc::now().naive_utc();
        Trip {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Lisbon".into(),
            description: None,
            destination: Some("Portugal".into()),
            start_date: start,
            end_date: end,
            cover_image_url: None,
            tags: vec![],
            is_archived: false,
            archived_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn duration_is_inclusive() {
        let t = trip(
            NaiveDate::from_ymd_opt(2024, 5, 1),
            NaiveDate::from_ymd_opt(2024, 5, 3),
        );
        assert_eq!(t.duration_days(), Some(3));
        assert_eq!(trip(None, None).duration_days(), None);
    }

    #[test]
    fn tags_are_normalized() {
        let tags = vec![" Beach ".to_string(), "beach".into(), "".into(), "Food".into()];
        assert_eq!(normalize_tags(&tags), vec!["beach", "food"]);
    }

    #[test]
    fn create_rejects_inverted_dates() {
        let body = CreateTrip {
            title: "Rome".into(),
            description: None,
            destination: None,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            cover_image_url: None,
            tags: vec![],
        };
        let err = body.validate().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn update_checks_against_stored_dates() {
        let current = trip(NaiveDate::from_ymd_opt(2024, 6, 10), None);
        let body = UpdateTrip {
            end_date: NaiveDate::from_ymd_opt(2024, 6, 9),
            ..Default::default()
        };
        assert!(body.validate_against(&current).is_err());

        let body = UpdateTrip {
            end_date: NaiveDate::from_ymd_opt(2024, 6, 12),
            ..Default::default()
        };
        assert!(body.validate_against(&current).is_ok());
    }

    #[test]
    fn status_filter_maps_to_flag() {
        assert_eq!(TripStatusFilter::Active.archived_flag(), Some(false));
        assert_eq!(TripStatusFilter::Archived.archived_flag(), Some(true));
        assert_eq!(TripStatusFilter::All.archived_flag(), None);
    }
}
