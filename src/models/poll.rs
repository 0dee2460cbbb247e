use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Poll row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub question: String,
    pub allow_multiple: bool,
    pub closes_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Poll {
    /// Closed explicitly, or past its deadline at `now`
    pub fn is_closed_at(&self, now: NaiveDateTime) -> bool {
        self.closed_at.is_some() || self.closes_at.map(|deadline| deadline <= now).unwrap_or(false)
    }
}

/// Option with its current vote count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionTally {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub label: String,
    pub position: i32,
    pub votes: i64,
}

/// Poll with options, tallies and the caller's own selections
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    #[serde(flatten)]
    pub poll: Poll,
    pub is_closed: bool,
    pub total_votes: i64,
    pub options: Vec<PollOptionTally>,
    pub my_votes: Vec<Uuid>,
}

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 10;

/// Body of `POST /api/trips/{id}/polls`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoll {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple: bool,
    pub closes_at: Option<NaiveDateTime>,
}

impl Validate for CreatePoll {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("question", &self.question, 300).check(
            (MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&self.options.len()),
            "options",
            format!(
                "Between {} and {} options required",
                MIN_POLL_OPTIONS, MAX_POLL_OPTIONS
            ),
        );
        for (i, option) in self.options.iter().enumerate() {
            v.required(&format!("options[{}]", i), option, 200);
        }
        if let Some(closes_at) = self.closes_at {
            v.check(
                closes_at > chrono::Utc::now().naive_utc(),
                "closesAt",
                "Must be in the future",
            );
        }
        v.finish()
    }
}

/// Body of `POST /api/trips/{id}/polls/{pollId}/vote`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub option_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(closes_at: Option<NaiveDateTime>, closed_at: Option<NaiveDateTime>) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            question: "Where to eat?".into(),
            allow_multiple: false,
            closes_at,
            closed_at,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn deadline_closes_poll() {
        let now = chrono::Utc::now().naive_utc();
        assert!(!poll(None, None).is_closed_at(now));
        assert!(!poll(Some(now + Duration::hours(1)), None).is_closed_at(now));
        assert!(poll(Some(now - Duration::minutes(1)), None).is_closed_at(now));
        assert!(poll(None, Some(now)).is_closed_at(now));
    }
}
