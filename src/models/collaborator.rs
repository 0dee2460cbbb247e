use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Collaborator role on a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "OWNER" => Ok(Role::Owner),
            "ADMIN" => Ok(Role::Admin),
            "EDITOR" => Ok(Role::Editor),
            "VIEWER" => Ok(Role::Viewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(Role::Viewer)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Invitation state of a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CollaboratorStatus {
    Pending,
    Accepted,
    Declined,
}

impl CollaboratorStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(CollaboratorStatus::Pending),
            "ACCEPTED" => Ok(CollaboratorStatus::Accepted),
            "DECLINED" => Ok(CollaboratorStatus::Declined),
            _ => Err(format!("Invalid collaborator status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorStatus::Pending => "PENDING",
            CollaboratorStatus::Accepted => "ACCEPTED",
            CollaboratorStatus::Declined => "DECLINED",
        }
    }
}

/// Collaborator model: a user granted access to a trip
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub role: String, // Stored as TEXT in DB, use Role enum for type safety
    pub status: String,
    pub invited_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

impl Collaborator {
    /// Get the role as an enum
    pub fn role_enum(&self) -> Role {
        Role::from_str(&self.role).unwrap_or(Role::Viewer)
    }

    /// Get the status as an enum
    pub fn status_enum(&self) -> CollaboratorStatus {
        CollaboratorStatus::from_str(&self.status).unwrap_or(CollaboratorStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == CollaboratorStatus::Pending
    }
}

/// Collaborator row joined with the user it refers to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorWithUser {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
    pub user_name: String,
    pub user_email: String,
}

/// Pending invitation as seen by the invitee
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub trip_title: String,
    pub role: String,
    pub invited_by_name: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Body of `POST /api/trips/{id}/collaborators`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCollaborator {
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: Role,
}

fn default_invite_role() -> Role {
    Role::Viewer
}

impl Validate for InviteCollaborator {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("email", &self.email, 254)
            .email("email", Some(self.email.as_str()))
            .check(self.role != Role::Owner, "role", "Owner role cannot be granted");
        v.finish()
    }
}

/// Body of `PATCH /api/trips/{id}/collaborators/{collaboratorId}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCollaboratorRole {
    pub role: Role,
}

impl Validate for UpdateCollaboratorRole {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.check(self.role != Role::Owner, "role", "Owner role cannot be granted");
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Owner, Role::Admin, Role::Editor, Role::Viewer] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::from_str("editor").unwrap(), Role::Editor);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn unknown_role_degrades_to_viewer() {
        assert_eq!(Role::from("banana".to_string()), Role::Viewer);
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let parsed: CollaboratorStatus = serde_json::from_str("\"DECLINED\"").unwrap();
        assert_eq!(parsed, CollaboratorStatus::Declined);
    }
}
