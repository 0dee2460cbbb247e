use crate::error::RepositoryError;
use crate::models::{Collaborator, CollaboratorStatus, CollaboratorWithUser, Invitation, Role};
use sqlx::PgPool;
use uuid::Uuid;

const COLLABORATOR_COLUMNS: &str =
    "id, trip_id, user_id, role, status, invited_by, created_at, responded_at";

/// Repository for trip collaborators and their invitations
pub struct CollaboratorRepository {
    pool: PgPool,
}

impl CollaboratorRepository {
    /// Create a new CollaboratorRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The collaborator row linking `user_id` to `trip_id`, whatever its status
    pub async fn find(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM collaborators WHERE trip_id = $1 AND user_id = $2",
            COLLABORATOR_COLUMNS
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&sql)
            .bind(trip_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(collaborator)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Collaborator>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM collaborators WHERE id = $1",
            COLLABORATOR_COLUMNS
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(collaborator)
    }

    /// All collaborators of a trip with their user details, oldest first
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
    ) -> Result<Vec<CollaboratorWithUser>, RepositoryError> {
        let collaborators = sqlx::query_as::<_, CollaboratorWithUser>(
            r#"
            SELECT c.id, c.trip_id, c.user_id, c.role, c.status, c.created_at, c.responded_at,
                   u.name AS user_name, u.email AS user_email
            FROM collaborators c
            JOIN users u ON u.id = c.user_id
            WHERE c.trip_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collaborators)
    }

    /// Invite `user_id` as a PENDING collaborator. An existing row surfaces as `Duplicate`.
    pub async fn create(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        role: Role,
        invited_by: Uuid,
    ) -> Result<Collaborator, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO collaborators (trip_id, user_id, role, status, invited_by)
            VALUES ($1, $2, $3, 'PENDING', $4)
            RETURNING {}
            "#,
            COLLABORATOR_COLUMNS
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&sql)
            .bind(trip_id)
            .bind(user_id)
            .bind(role.as_str())
            .bind(invited_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(collaborator)
    }

    /// Reopen a DECLINED invitation as PENDING with a fresh role and inviter.
    /// Returns `None` when the row is not declined.
    pub async fn reinvite(
        &self,
        id: Uuid,
        role: Role,
        invited_by: Uuid,
    ) -> Result<Option<Collaborator>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE collaborators
            SET status = 'PENDING', role = $2, invited_by = $3,
                created_at = NOW(), responded_at = NULL
            WHERE id = $1 AND status = 'DECLINED'
            RETURNING {}
            "#,
            COLLABORATOR_COLUMNS
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&sql)
            .bind(id)
            .bind(role.as_str())
            .bind(invited_by)
            .fetch_optional(&self.pool)
            .await?;

        Ok(collaborator)
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        role: Role,
    ) -> Result<Collaborator, RepositoryError> {
        let sql = format!(
            "UPDATE collaborators SET role = $2 WHERE id = $1 RETURNING {}",
            COLLABORATOR_COLUMNS
        );
        sqlx::query_as::<_, Collaborator>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Collaborator not found".to_string()))
    }

    /// Move a PENDING invitation to `status`. Returns `None` when it was no longer pending.
    pub async fn respond(
        &self,
        id: Uuid,
        status: CollaboratorStatus,
    ) -> Result<Option<Collaborator>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE collaborators
            SET status = $2, responded_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {}
            "#,
            COLLABORATOR_COLUMNS
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(collaborator)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query("DELETE FROM collaborators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Pending invitations addressed to `user_id`, newest first
    pub async fn pending_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>, RepositoryError> {
        let invitations = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT c.id, c.trip_id, t.title AS trip_title, c.role,
                   inviter.name AS invited_by_name, c.created_at
            FROM collaborators c
            JOIN trips t ON t.id = c.trip_id AND t.deleted_at IS NULL
            LEFT JOIN users inviter ON inviter.id = c.invited_by
            WHERE c.user_id = $1 AND c.status = 'PENDING'
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invitations)
    }

    /// Users who can see the trip: the owner plus every accepted collaborator
    pub async fn member_ids(&self, trip_id: Uuid) -> Result<Vec<Uuid>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT owner_id FROM trips WHERE id = $1
            UNION
            SELECT user_id FROM collaborators WHERE trip_id = $1 AND status = 'ACCEPTED'
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
