use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Chat message posted in a trip
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

pub const MAX_MESSAGE_LEN: usize = 4000;

/// Body of `POST /api/trips/{id}/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub content: String,
}

impl Validate for CreateMessage {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("content", &self.content, MAX_MESSAGE_LEN);
        v.finish()
    }
}

/// `?before=&limit=` cursor over a trip's messages
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MessageQuery {
    pub before: Option<NaiveDateTime>,
    pub limit: Option<i64>,
}

impl MessageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }
}
