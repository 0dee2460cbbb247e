//! Bulk trip operations.
//!
//! Each trip ID is checked and updated on its own: there is no cross-item
//! transaction, and one failure never affects the others. The decision for a
//! single item is a pure function so it can be tested without a database.

use crate::error::{AppError, AppResult};
use crate::models::trip::{normalize_tags, MAX_TAGS};
use crate::models::Trip;
use crate::permissions::TripAccess;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub const MAX_BULK_ITEMS: usize = 100;

pub const REASON_ALREADY_ARCHIVED: &str = "Already archived";
pub const ERROR_NOT_FOUND: &str = "Trip not found";
pub const ERROR_FORBIDDEN: &str = "Insufficient permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Archive,
    Delete,
    Tag,
}

/// Body of `POST /api/trips/bulk/archive` and `/bulk/delete`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTripRequest {
    pub trip_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    #[default]
    Add,
    Remove,
    Replace,
}

/// Body of `POST /api/trips/bulk/tag`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTagRequest {
    pub trip_ids: Vec<Uuid>,
    pub tags: Vec<String>,
    #[serde(default)]
    pub mode: TagMode,
}

/// Reject empty, oversized or repeated ID lists before touching any trip
pub fn check_trip_ids(trip_ids: &[Uuid]) -> AppResult<()> {
    if trip_ids.is_empty() {
        return Err(AppError::invalid_field(
            "tripIds",
            "At least one trip ID is required",
        ));
    }
    if trip_ids.len() > MAX_BULK_ITEMS {
        return Err(AppError::invalid_field(
            "tripIds",
            format!("At most {} trip IDs per request", MAX_BULK_ITEMS),
        ));
    }
    let distinct: HashSet<&Uuid> = trip_ids.iter().collect();
    if distinct.len() != trip_ids.len() {
        return Err(AppError::invalid_field("tripIds", "Trip IDs must be unique"));
    }
    Ok(())
}

/// What to do with one trip of a bulk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkDecision {
    /// Perform the update
    Apply,
    /// Nothing to change; reported as a success with this reason
    Skip(&'static str),
    /// Reported as a failure with this error
    Reject(&'static str),
}

pub fn decide(action: BulkAction, trip: Option<&Trip>, access: &TripAccess) -> BulkDecision {
    let trip = match trip {
        Some(trip) if !trip.is_deleted() => trip,
        _ => return BulkDecision::Reject(ERROR_NOT_FOUND),
    };

    match action {
        BulkAction::Archive => {
            if !access.can_edit() {
                BulkDecision::Reject(ERROR_FORBIDDEN)
            } else if trip.is_archived {
                BulkDecision::Skip(REASON_ALREADY_ARCHIVED)
            } else {
                BulkDecision::Apply
            }
        }
        BulkAction::Delete => {
            if access.can_delete() {
                BulkDecision::Apply
            } else {
                BulkDecision::Reject(ERROR_FORBIDDEN)
            }
        }
        BulkAction::Tag => {
            if access.can_edit() {
                BulkDecision::Apply
            } else {
                BulkDecision::Reject(ERROR_FORBIDDEN)
            }
        }
    }
}

/// New tag set for a trip under `mode`, capped at the tag limit
pub fn apply_tags(current: &[String], tags: &[String], mode: TagMode) -> Vec<String> {
    let tags = normalize_tags(tags);
    let mut result = match mode {
        TagMode::Add => {
            let mut merged = current.to_vec();
            merged.extend(tags);
            normalize_tags(&merged)
        }
        TagMode::Remove => current
            .iter()
            .filter(|tag| !tags.contains(tag))
            .cloned()
            .collect(),
        TagMode::Replace => tags,
    };
    result.truncate(MAX_TAGS);
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub trip_id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn applied(trip_id: Uuid) -> Self {
        Self {
            trip_id,
            success: true,
            reason: None,
            error: None,
        }
    }

    pub fn skipped(trip_id: Uuid, reason: &str) -> Self {
        Self {
            trip_id,
            success: true,
            reason: Some(reason.to_string()),
            error: None,
        }
    }

    pub fn failed(trip_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            trip_id,
            success: false,
            reason: None,
            error: Some(error.into()),
        }
    }
}

/// Response body of every bulk endpoint; only the counter for its action is present
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub success: bool,
    pub processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagged: Option<usize>,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkSummary {
    pub fn from_results(action: BulkAction, results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        let counter = Some(succeeded);
        Self {
            success: failed == 0,
            processed: results.len(),
            archived: if action == BulkAction::Archive { counter } else { None },
            deleted: if action == BulkAction::Delete { counter } else { None },
            tagged: if action == BulkAction::Tag { counter } else { None },
            failed,
            results,
        }
    }

    /// 200 when every item succeeded, 207 multi-status otherwise
    pub fn status_code(&self) -> u16 {
        if self.failed == 0 {
            200
        } else {
            207
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollaboratorStatus, Role};

    fn trip(archived: bool, deleted: bool) -> Trip {
        let now = chrono::Utc::now().naive_utc();
        Trip {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Kyoto".into(),
            description: None,
            destination: None,
            start_date: None,
            end_date: None,
            cover_image_url: None,
            tags: vec![],
            is_archived: archived,
            archived_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: if deleted { Some(now) } else { None },
        }
    }

    fn accepted(role: Role) -> TripAccess {
        TripAccess::new(false, Some(role), Some(CollaboratorStatus::Accepted))
    }

    #[test]
    fn archive_decisions() {
        let owner = TripAccess::owner();
        assert_eq!(
            decide(BulkAction::Archive, None, &owner),
            BulkDecision::Reject(ERROR_NOT_FOUND)
        );
        assert_eq!(
            decide(BulkAction::Archive, Some(&trip(false, true)), &owner),
            BulkDecision::Reject(ERROR_NOT_FOUND)
        );
        assert_eq!(
            decide(BulkAction::Archive, Some(&trip(true, false)), &owner),
            BulkDecision::Skip(REASON_ALREADY_ARCHIVED)
        );
        assert_eq!(
            decide(BulkAction::Archive, Some(&trip(false, false)), &accepted(Role::Viewer)),
            BulkDecision::Reject(ERROR_FORBIDDEN)
        );
        assert_eq!(
            decide(BulkAction::Archive, Some(&trip(false, false)), &accepted(Role::Editor)),
            BulkDecision::Apply
        );
    }

    #[test]
    fn permission_is_checked_before_archive_state() {
        assert_eq!(
            decide(BulkAction::Archive, Some(&trip(true, false)), &TripAccess::none()),
            BulkDecision::Reject(ERROR_FORBIDDEN)
        );
    }

    #[test]
    fn delete_needs_owner_rights() {
        let t = trip(false, false);
        assert_eq!(
            decide(BulkAction::Delete, Some(&t), &accepted(Role::Admin)),
            BulkDecision::Reject(ERROR_FORBIDDEN)
        );
        assert_eq!(
            decide(BulkAction::Delete, Some(&t), &accepted(Role::Owner)),
            BulkDecision::Apply
        );
    }

    #[test]
    fn id_list_limits() {
        assert!(check_trip_ids(&[]).is_err());
        let ids: Vec<Uuid> = (0..101).map(|_| Uuid::new_v4()).collect();
        assert_eq!(check_trip_ids(&ids).unwrap_err().status_code(), 400);
        assert!(check_trip_ids(&ids[..100]).is_ok());
        let id = Uuid::new_v4();
        assert!(check_trip_ids(&[id, id]).is_err());
    }

    #[test]
    fn summary_counts_add_up() {
        let results = vec![
            BulkItemResult::applied(Uuid::new_v4()),
            BulkItemResult::skipped(Uuid::new_v4(), REASON_ALREADY_ARCHIVED),
            BulkItemResult::failed(Uuid::new_v4(), ERROR_NOT_FOUND),
        ];
        let summary = BulkSummary::from_results(BulkAction::Archive, results);
        assert_eq!(summary.archived, Some(2));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.archived.unwrap() + summary.failed, summary.processed);
        assert_eq!(summary.status_code(), 207);
        assert!(!summary.success);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("deleted").is_none());
        assert_eq!(json["results"][1]["reason"], REASON_ALREADY_ARCHIVED);
        assert!(json["results"][0].get("error").is_none());
    }

    #[test]
    fn all_successes_are_200() {
        let summary =
            BulkSummary::from_results(BulkAction::Delete, vec![BulkItemResult::applied(Uuid::new_v4())]);
        assert_eq!(summary.status_code(), 200);
        assert_eq!(summary.deleted, Some(1));
    }

    #[test]
    fn tag_modes() {
        let current = vec!["beach".to_string(), "food".to_string()];
        let tags = vec![" Food ".to_string(), "Hiking".to_string()];
        assert_eq!(apply_tags(&current, &tags, TagMode::Add), vec!["beach", "food", "hiking"]);
        assert_eq!(apply_tags(&current, &tags, TagMode::Remove), vec!["beach"]);
        assert_eq!(apply_tags(&current, &tags, TagMode::Replace), vec!["food", "hiking"]);
    }
}
