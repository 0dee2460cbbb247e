use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// User account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// Public projection of a user, embedded in collaborator and message listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Normalise an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Validate for RegisterUser {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("email", &self.email, 254)
            .email("email", Some(self.email.as_str()))
            .required("name", &self.name, 100)
            .check(
                self.password.chars().count() >= 8,
                "password",
                "Must be at least 8 characters",
            )
            .max_len("password", Some(self.password.as_str()), 128);
        v.finish()
    }
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("email", &self.email, 254)
            .check(!self.password.is_empty(), "password", "Required");
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            name: "Ana".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ana@example.com");
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
