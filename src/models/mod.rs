//! Domain models for the WanderPlan backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the travel planner.

pub mod activity;
pub mod budget;
pub mod collaborator;
pub mod crm;
pub mod event;
pub mod expense;
pub mod idea;
pub mod landing_page;
pub mod message;
pub mod notification;
pub mod poll;
pub mod trip;
pub mod user;

// Re-export all models for convenient access
pub use activity::Activity;
pub use budget::Budget;
pub use collaborator::{Collaborator, CollaboratorStatus, CollaboratorWithUser, Invitation, Role};
pub use crm::{
    CrmClient, Invoice, InvoiceStatus, InvoiceTotals, LineItem, Proposal, ProposalStatus,
};
pub use event::{Event, EventCategory, EventPosition};
pub use expense::Expense;
pub use idea::{Idea, IdeaStatus};
pub use landing_page::LandingPage;
pub use message::Message;
pub use notification::{NewNotification, Notification};
pub use poll::{Poll, PollOptionTally, PollResults};
pub use trip::{Trip, TripStatusFilter};
pub use user::{User, UserSummary};
