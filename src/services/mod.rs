//! Business logic. Services check permissions, call repositories, then record
//! activity and push realtime events for successful mutations.

pub mod access;
pub mod activity;
pub mod auth_service;
pub mod bulk;
pub mod collaborator_service;
pub mod crm_service;
pub mod expense_service;
pub mod export_service;
pub mod idea_service;
pub mod itinerary_service;
pub mod landing_page_service;
pub mod message_service;
pub mod notification_service;
pub mod poll_service;
pub mod settlement;
pub mod trip_service;

pub use access::AccessService;
pub use activity::ActivityService;
pub use auth_service::AuthService;
pub use bulk::{BulkSummary, BulkTagRequest, BulkTripRequest, TagMode, MAX_BULK_ITEMS};
pub use collaborator_service::CollaboratorService;
pub use crm_service::CrmService;
pub use expense_service::ExpenseService;
pub use export_service::{ExportService, ExportedFile};
pub use idea_service::IdeaService;
pub use itinerary_service::ItineraryService;
pub use landing_page_service::LandingPageService;
pub use message_service::MessageService;
pub use notification_service::NotificationService;
pub use poll_service::PollService;
pub use settlement::ExpenseSummary;
pub use trip_service::{TripDetails, TripService};
