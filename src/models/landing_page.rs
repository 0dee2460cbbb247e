use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Public marketing page built from content blocks
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub content: Value,
    pub theme: Option<String>,
    pub is_published: bool,
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Lowercase alphanumeric words joined by single hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    (3..=64).contains(&slug.len())
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Body of `POST /api/landing-pages`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLandingPage {
    pub title: String,
    pub slug: String,
    pub trip_id: Option<Uuid>,
    #[serde(default = "empty_blocks")]
    pub content: Value,
    pub theme: Option<String>,
}

fn empty_blocks() -> Value {
    Value::Array(Vec::new())
}

impl Validate for CreateLandingPage {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("title", &self.title, 200)
            .check(
                is_valid_slug(&self.slug),
                "slug",
                "Use 3-64 lowercase letters, digits and single hyphens",
            )
            .check(self.content.is_array(), "content", "Must be an array of blocks")
            .max_len("theme", self.theme.as_deref(), 50);
        v.finish()
    }
}

/// Body of `PATCH /api/landing-pages/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLandingPage {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub trip_id: Option<Uuid>,
    pub content: Option<Value>,
    pub theme: Option<String>,
}

impl Validate for UpdateLandingPage {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("title", self.title.as_deref(), 200)
            .max_len("theme", self.theme.as_deref(), 50);
        if let Some(slug) = &self.slug {
            v.check(
                is_valid_slug(slug),
                "slug",
                "Use 3-64 lowercase letters, digits and single hyphens",
            );
        }
        if let Some(content) = &self.content {
            v.check(content.is_array(), "content", "Must be an array of blocks");
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("summer-in-lisbon"));
        assert!(is_valid_slug("trip2025"));
        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug("Summer"));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug("with space"));
    }
}
