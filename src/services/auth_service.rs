use crate::auth::{hash_password, verify_password};
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::user::{normalize_email, LoginRequest, RegisterUser};
use crate::models::User;
use crate::repositories::UserRepository;
use crate::validation::Validate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Account registration and credential checks
pub struct AuthService {
    user_repo: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn register(&self, input: &RegisterUser) -> AppResult<User> {
        input.validate()?;

        let email = normalize_email(&input.email);
        let password_hash = hash_password(&input.password).await?;

        let user = self
            .user_repo
            .create(&email, input.name.trim(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Duplicate(_) => {
                    AppError::Conflict("Email is already registered".to_string())
                }
                other => other.into(),
            })?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials. Unknown emails and wrong passwords fail identically.
    pub async fn login(&self, input: &LoginRequest) -> AppResult<User> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(&normalize_email(&input.email))
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&input.password, &user.password_hash).await {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    /// User behind a verified session; a deleted account reads as signed out
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }
}
