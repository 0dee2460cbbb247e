use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Idea review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdeaStatus {
    Suggested,
    Approved,
    Rejected,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Suggested => "SUGGESTED",
            IdeaStatus::Approved => "APPROVED",
            IdeaStatus::Rejected => "REJECTED",
        }
    }
}

/// Idea suggested for a trip, with its vote tally
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub status: String,
    pub votes: i64,
    pub voted_by_me: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Body of `POST /api/trips/{id}/ideas`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIdea {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Validate for CreateIdea {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("title", &self.title, 200)
            .max_len("description", self.description.as_deref(), 2000)
            .url("url", self.url.as_deref());
        v.finish()
    }
}

/// Body of `PATCH /api/trips/{id}/ideas/{ideaId}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateIdeaStatus {
    pub status: IdeaStatus,
}
