use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Entry of a trip's activity feed
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub kind: String, // "trip_updated", "expense_created", ...
    pub summary: String,
    pub metadata: Value,
    pub created_at: NaiveDateTime,
}
