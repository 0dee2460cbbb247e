//! WanderPlan Backend Library
//!
//! This module exposes the backend components for use by the binaries and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod realtime;
pub mod repositories;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::SessionSigner;
use database::Database;
use realtime::RelayEmitter;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all services
pub struct AppState {
    pub config: AppConfig,
    pub database: Database,
    pub sessions: SessionSigner,
    pub emitter: RelayEmitter,
    pub auth: Arc<AuthService>,
    pub access: Arc<AccessService>,
    pub activity: Arc<ActivityService>,
    pub notifications: Arc<NotificationService>,
    pub trips: Arc<TripService>,
    pub collaborators: Arc<CollaboratorService>,
    pub itinerary: Arc<ItineraryService>,
    pub expenses: Arc<ExpenseService>,
    pub messages: Arc<MessageService>,
    pub ideas: Arc<IdeaService>,
    pub polls: Arc<PollService>,
    pub crm: Arc<CrmService>,
    pub landing_pages: Arc<LandingPageService>,
    pub exports: Arc<ExportService>,
}

impl AppState {
    /// Create a new AppState with repositories and services wired over `pool`
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> Self {
        let emitter = RelayEmitter::new(&config.relay);
        Self::with_emitter(pool, config, emitter)
    }

    pub fn with_emitter(pool: sqlx::PgPool, config: AppConfig, emitter: RelayEmitter) -> Self {
        let database = Database::new(pool.clone());

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let trip_repo = Arc::new(TripRepository::new(pool.clone()));
        let collaborator_repo = Arc::new(CollaboratorRepository::new(pool.clone()));
        let event_repo = Arc::new(EventRepository::new(pool.clone()));
        let expense_repo = Arc::new(ExpenseRepository::new(pool.clone()));
        let budget_repo = Arc::new(BudgetRepository::new(pool.clone()));
        let message_repo = Arc::new(MessageRepository::new(pool.clone()));
        let idea_repo = Arc::new(IdeaRepository::new(pool.clone()));
        let poll_repo = Arc::new(PollRepository::new(pool.clone()));
        let activity_repo = Arc::new(ActivityRepository::new(pool.clone()));
        let notification_repo = Arc::new(NotificationRepository::new(pool.clone()));
        let client_repo = Arc::new(ClientRepository::new(pool.clone()));
        let proposal_repo = Arc::new(ProposalRepository::new(pool.clone()));
        let invoice_repo = Arc::new(InvoiceRepository::new(pool.clone()));
        let landing_page_repo = Arc::new(LandingPageRepository::new(pool));

        let access = Arc::new(AccessService::new(trip_repo.clone(), collaborator_repo.clone()));
        let activity = Arc::new(ActivityService::new(activity_repo, emitter.clone()));
        let notifications = Arc::new(NotificationService::new(notification_repo));

        Self {
            sessions: SessionSigner::new(&config.session),
            config,
            database,
            auth: Arc::new(AuthService::new(user_repo.clone())),
            trips: Arc::new(TripService::new(
                trip_repo,
                access.clone(),
                activity.clone(),
                emitter.clone(),
            )),
            collaborators: Arc::new(CollaboratorService::new(
                collaborator_repo.clone(),
                user_repo,
                access.clone(),
                activity.clone(),
                notifications.clone(),
                emitter.clone(),
            )),
            itinerary: Arc::new(ItineraryService::new(
                event_repo.clone(),
                access.clone(),
                activity.clone(),
                emitter.clone(),
            )),
            expenses: Arc::new(ExpenseService::new(
                expense_repo.clone(),
                budget_repo.clone(),
                collaborator_repo,
                access.clone(),
                activity.clone(),
                emitter.clone(),
            )),
            messages: Arc::new(MessageService::new(message_repo, access.clone(), emitter.clone())),
            ideas: Arc::new(IdeaService::new(
                idea_repo,
                access.clone(),
                activity.clone(),
                emitter.clone(),
            )),
            polls: Arc::new(PollService::new(
                poll_repo,
                access.clone(),
                activity.clone(),
                emitter.clone(),
            )),
            crm: Arc::new(CrmService::new(
                client_repo,
                proposal_repo,
                invoice_repo,
                access.clone(),
            )),
            landing_pages: Arc::new(LandingPageService::new(landing_page_repo, access.clone())),
            exports: Arc::new(ExportService::new(
                event_repo,
                expense_repo,
                budget_repo,
                access.clone(),
            )),
            access,
            activity,
            notifications,
            emitter,
        }
    }
}
