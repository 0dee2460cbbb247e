pub mod activity_repository;
pub mod budget_repository;
pub mod client_repository;
pub mod collaborator_repository;
pub mod event_repository;
pub mod expense_repository;
pub mod idea_repository;
pub mod invoice_repository;
pub mod landing_page_repository;
pub mod message_repository;
pub mod notification_repository;
pub mod poll_repository;
pub mod proposal_repository;
pub mod trip_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use activity_repository::ActivityRepository;
pub use budget_repository::BudgetRepository;
pub use client_repository::ClientRepository;
pub use collaborator_repository::CollaboratorRepository;
pub use event_repository::EventRepository;
pub use expense_repository::ExpenseRepository;
pub use idea_repository::IdeaRepository;
pub use invoice_repository::{InvoiceDraft, InvoiceRepository};
pub use landing_page_repository::LandingPageRepository;
pub use message_repository::MessageRepository;
pub use notification_repository::NotificationRepository;
pub use poll_repository::PollRepository;
pub use proposal_repository::ProposalRepository;
pub use trip_repository::{TripListFilter, TripRepository};
pub use user_repository::UserRepository;
