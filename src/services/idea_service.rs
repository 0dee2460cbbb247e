use super::activity::{kinds, ActivityService};
use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::idea::{CreateIdea, UpdateIdeaStatus};
use crate::models::Idea;
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::IdeaRepository;
use crate::validation::Validate;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Idea board with up-votes
pub struct IdeaService {
    idea_repo: Arc<IdeaRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    emitter: RelayEmitter,
}

impl IdeaService {
    pub fn new(
        idea_repo: Arc<IdeaRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            idea_repo,
            access,
            activity,
            emitter,
        }
    }

    pub async fn list(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<Vec<Idea>> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        Ok(self.idea_repo.list_for_trip(trip_id, user_id).await?)
    }

    pub async fn create(&self, trip_id: Uuid, user_id: Uuid, input: &CreateIdea) -> AppResult<Idea> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::View).await?;

        let idea = self.idea_repo.create(trip_id, user_id, input).await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::IDEA_CREATED,
                format!("Suggested \"{}\"", idea.title),
                json!({ "ideaId": idea.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "created", "idea": &idea }));
        Ok(idea)
    }

    pub async fn set_status(
        &self,
        trip_id: Uuid,
        idea_id: Uuid,
        user_id: Uuid,
        input: &UpdateIdeaStatus,
    ) -> AppResult<Idea> {
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        if !self.idea_repo.set_status(trip_id, idea_id, input.status).await? {
            return Err(AppError::NotFound("Idea not found".to_string()));
        }
        let idea = self.find(trip_id, idea_id, user_id).await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::IDEA_STATUS_CHANGED,
                format!("Marked \"{}\" as {}", idea.title, input.status.as_str()),
                json!({ "ideaId": idea.id, "status": input.status }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "status", "idea": &idea }));
        Ok(idea)
    }

    /// Add the caller's vote, or take it back if already cast
    pub async fn toggle_vote(&self, trip_id: Uuid, idea_id: Uuid, user_id: Uuid) -> AppResult<Idea> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        self.find(trip_id, idea_id, user_id).await?;

        self.idea_repo.toggle_vote(idea_id, user_id).await?;
        let idea = self.find(trip_id, idea_id, user_id).await?;

        self.emit(
            trip_id,
            json!({ "action": "vote", "ideaId": idea.id, "votes": idea.votes }),
        );
        Ok(idea)
    }

    /// Authors delete their own ideas; editors delete anyone's
    pub async fn delete(&self, trip_id: Uuid, idea_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let (_, access) = self.access.require(trip_id, user_id, Permission::View).await?;
        let idea = self.find(trip_id, idea_id, user_id).await?;
        if idea.author_id != user_id && !access.can_edit() {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        if !self.idea_repo.soft_delete(trip_id, idea_id).await? {
            return Err(AppError::NotFound("Idea not found".to_string()));
        }
        self.emit(trip_id, json!({ "action": "deleted", "ideaId": idea_id }));
        Ok(())
    }

    async fn find(&self, trip_id: Uuid, idea_id: Uuid, viewer_id: Uuid) -> AppResult<Idea> {
        self.idea_repo
            .find(trip_id, idea_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Idea not found".to_string()))
    }

    fn emit(&self, trip_id: Uuid, data: serde_json::Value) {
        self.emitter.emit(trip_id, RelayEvent::IdeaUpdated, data);
    }
}
