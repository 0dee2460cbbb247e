use super::activity::{kinds, ActivityService};
use super::{AccessService, NotificationService};
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::collaborator::{InviteCollaborator, UpdateCollaboratorRole};
use crate::models::user::normalize_email;
use crate::models::{
    Collaborator, CollaboratorStatus, CollaboratorWithUser, Invitation, NewNotification, Role,
};
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::{CollaboratorRepository, UserRepository};
use crate::validation::Validate;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for trip sharing: invitations, roles and removal
pub struct CollaboratorService {
    collaborator_repo: Arc<CollaboratorRepository>,
    user_repo: Arc<UserRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    notifications: Arc<NotificationService>,
    emitter: RelayEmitter,
}

impl CollaboratorService {
    pub fn new(
        collaborator_repo: Arc<CollaboratorRepository>,
        user_repo: Arc<UserRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        notifications: Arc<NotificationService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            collaborator_repo,
            user_repo,
            access,
            activity,
            notifications,
            emitter,
        }
    }

    pub async fn list(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<Vec<CollaboratorWithUser>> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        Ok(self.collaborator_repo.list_for_trip(trip_id).await?)
    }

    /// Invite an existing account to the trip as a pending collaborator
    pub async fn invite(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &InviteCollaborator,
    ) -> AppResult<Collaborator> {
        input.validate()?;
        let (trip, _) = self
            .access
            .require(trip_id, user_id, Permission::ManageCollaborators)
            .await?;

        let invitee = self
            .user_repo
            .find_by_email(&normalize_email(&input.email))
            .await?
            .ok_or_else(|| AppError::NotFound("No user with that email".to_string()))?;

        if invitee.id == trip.owner_id {
            return Err(AppError::Conflict("User already owns this trip".to_string()));
        }

        let already_member = || AppError::Conflict("User is already a collaborator".to_string());
        let collaborator = match self
            .collaborator_repo
            .create(trip_id, invitee.id, input.role, user_id)
            .await
        {
            Ok(collaborator) => collaborator,
            // a declined invitation can be sent again
            Err(RepositoryError::Duplicate(_)) => {
                let existing = self
                    .collaborator_repo
                    .find(trip_id, invitee.id)
                    .await?
                    .ok_or_else(already_member)?;
                self.collaborator_repo
                    .reinvite(existing.id, input.role, user_id)
                    .await?
                    .ok_or_else(already_member)?
            }
            Err(other) => return Err(other.into()),
        };
        info!(
            "User {} invited {} to trip {} as {}",
            user_id,
            invitee.id,
            trip_id,
            input.role.as_str()
        );

        let inviter_name = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "Someone".to_string());
        self.notifications
            .notify(NewNotification {
                user_id: invitee.id,
                kind: "trip_invitation",
                title: format!("{} invited you to \"{}\"", inviter_name, trip.title),
                body: Some(format!("Role: {}", input.role.as_str())),
                link: Some("/invitations".to_string()),
            })
            .await;
        self.activity
            .record(
                trip_id,
                user_id,
                kinds::COLLABORATOR_INVITED,
                format!("Invited {} as {}", invitee.name, input.role.as_str()),
                json!({ "collaboratorId": collaborator.id, "userId": invitee.id }),
            )
            .await;
        self.emit(trip_id, "invited", &collaborator);

        Ok(collaborator)
    }

    pub async fn update_role(
        &self,
        trip_id: Uuid,
        collaborator_id: Uuid,
        user_id: Uuid,
        input: &UpdateCollaboratorRole,
    ) -> AppResult<Collaborator> {
        input.validate()?;
        let (_, access) = self
            .access
            .require(trip_id, user_id, Permission::ManageCollaborators)
            .await?;

        let existing = self.find_in_trip(trip_id, collaborator_id).await?;
        if existing.role_enum() == Role::Owner && !access.is_owner {
            return Err(AppError::Forbidden(
                "Only the trip owner can change a co-owner's role".to_string(),
            ));
        }

        let collaborator = self
            .collaborator_repo
            .update_role(collaborator_id, input.role)
            .await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::COLLABORATOR_UPDATED,
                format!("Changed a collaborator's role to {}", input.role.as_str()),
                json!({ "collaboratorId": collaborator_id }),
            )
            .await;
        self.emit(trip_id, "role-changed", &collaborator);

        Ok(collaborator)
    }

    /// Remove a collaborator. Managers may remove anyone; everyone may remove themself.
    pub async fn remove(&self, trip_id: Uuid, collaborator_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let existing = self.find_in_trip(trip_id, collaborator_id).await?;

        // Leaving needs no role: a pending invitee has no view access yet
        if existing.user_id != user_id {
            let (_, access) = self
                .access
                .require(trip_id, user_id, Permission::ManageCollaborators)
                .await?;
            if existing.role_enum() == Role::Owner && !access.is_owner {
                return Err(AppError::Forbidden(
                    "Only the trip owner can remove a co-owner".to_string(),
                ));
            }
        }

        if !self.collaborator_repo.delete(collaborator_id).await? {
            return Err(AppError::NotFound("Collaborator not found".to_string()));
        }

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::COLLABORATOR_REMOVED,
                if existing.user_id == user_id {
                    "Left the trip".to_string()
                } else {
                    "Removed a collaborator".to_string()
                },
                json!({ "collaboratorId": collaborator_id, "userId": existing.user_id }),
            )
            .await;
        self.emit(trip_id, "removed", &existing);
        Ok(())
    }

    pub async fn pending_invitations(&self, user_id: Uuid) -> AppResult<Vec<Invitation>> {
        Ok(self.collaborator_repo.pending_for_user(user_id).await?)
    }

    /// Accept or decline an invitation addressed to `user_id`
    pub async fn respond(
        &self,
        collaborator_id: Uuid,
        user_id: Uuid,
        accept: bool,
    ) -> AppResult<Collaborator> {
        let invitation = self
            .collaborator_repo
            .find_by_id(collaborator_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        let gone = || AppError::Gone("Invitation is no longer pending".to_string());
        if !invitation.is_pending() {
            return Err(gone());
        }

        let status = if accept {
            CollaboratorStatus::Accepted
        } else {
            CollaboratorStatus::Declined
        };
        let collaborator = self
            .collaborator_repo
            .respond(collaborator_id, status)
            .await?
            .ok_or_else(gone)?;

        let name = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "A collaborator".to_string());
        let (kind, verb) = if accept {
            (kinds::COLLABORATOR_JOINED, "accepted")
        } else {
            (kinds::COLLABORATOR_DECLINED, "declined")
        };

        self.activity
            .record(
                collaborator.trip_id,
                user_id,
                kind,
                format!("{} {} the invitation", name, verb),
                json!({ "collaboratorId": collaborator.id }),
            )
            .await;
        if let Some(inviter) = collaborator.invited_by {
            self.notifications
                .notify(NewNotification {
                    user_id: inviter,
                    kind: "invitation_response",
                    title: format!("{} {} your invitation", name, verb),
                    body: None,
                    link: Some(format!("/trips/{}", collaborator.trip_id)),
                })
                .await;
        }
        self.emit(collaborator.trip_id, verb, &collaborator);

        Ok(collaborator)
    }

    async fn find_in_trip(&self, trip_id: Uuid, collaborator_id: Uuid) -> AppResult<Collaborator> {
        self.collaborator_repo
            .find_by_id(collaborator_id)
            .await?
            .filter(|c| c.trip_id == trip_id)
            .ok_or_else(|| AppError::NotFound("Collaborator not found".to_string()))
    }

    fn emit(&self, trip_id: Uuid, action: &str, collaborator: &Collaborator) {
        self.emitter.emit(
            trip_id,
            RelayEvent::CollaboratorUpdated,
            json!({ "action": action, "collaborator": collaborator }),
        );
    }
}
