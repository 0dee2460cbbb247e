use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::message::{CreateMessage, MessageQuery};
use crate::models::Message;
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::MessageRepository;
use crate::validation::Validate;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Trip chat
pub struct MessageService {
    message_repo: Arc<MessageRepository>,
    access: Arc<AccessService>,
    emitter: RelayEmitter,
}

impl MessageService {
    pub fn new(
        message_repo: Arc<MessageRepository>,
        access: Arc<AccessService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            message_repo,
            access,
            emitter,
        }
    }

    /// Newest first; page backwards with `before`
    pub async fn list(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        query: &MessageQuery,
    ) -> AppResult<Vec<Message>> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        Ok(self
            .message_repo
            .list_for_trip(trip_id, query.before, query.limit())
            .await?)
    }

    pub async fn post(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &CreateMessage,
    ) -> AppResult<Message> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::View).await?;

        let message = self
            .message_repo
            .create(trip_id, user_id, input.content.trim())
            .await?;
        debug!("Message {} posted to trip {}", message.id, trip_id);

        let data = serde_json::to_value(&message)?;
        self.emitter.emit(trip_id, RelayEvent::MessageSent, data);
        Ok(message)
    }

    /// Authors delete their own messages; admins delete anyone's
    pub async fn delete(&self, trip_id: Uuid, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let (_, access) = self.access.require(trip_id, user_id, Permission::View).await?;
        let message = self
            .message_repo
            .find(trip_id, message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

        if message.author_id != user_id && !access.can_admin() {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        if !self.message_repo.soft_delete(trip_id, message_id).await? {
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        self.emitter.emit(
            trip_id,
            RelayEvent::MessageDeleted,
            json!({ "messageId": message_id }),
        );
        Ok(())
    }
}
