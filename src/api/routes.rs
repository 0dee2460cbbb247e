//! HTTP API route definitions

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    self, activity, auth, collaborators, crm, expenses, export, ideas, itinerary, landing_pages,
    messages, notifications, polls, trips,
};
use crate::AppState;

/// Create the main API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes that need no session
    let public_routes = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/public/pages/{slug}", get(landing_pages::public_page));

    let trip_routes = Router::new()
        .route("/api/auth/session", get(auth::session))
        // Trips (static bulk routes before dynamic {id})
        .route("/api/trips", get(trips::list_trips).post(trips::create_trip))
        .route("/api/trips/bulk/archive", post(trips::bulk_archive))
        .route("/api/trips/bulk/delete", post(trips::bulk_delete))
        .route("/api/trips/bulk/tag", post(trips::bulk_tag))
        .route(
            "/api/trips/{id}",
            get(trips::get_trip)
                .patch(trips::update_trip)
                .delete(trips::delete_trip),
        )
        // Collaborators
        .route(
            "/api/trips/{id}/collaborators",
            get(collaborators::list_collaborators).post(collaborators::invite_collaborator),
        )
        .route(
            "/api/trips/{id}/collaborators/{collaborator_id}",
            patch(collaborators::update_collaborator)
                .delete(collaborators::remove_collaborator),
        )
        .route("/api/invitations", get(collaborators::list_invitations))
        .route(
            "/api/invitations/{collaborator_id}/accept",
            post(collaborators::accept_invitation),
        )
        .route(
            "/api/invitations/{collaborator_id}/decline",
            post(collaborators::decline_invitation),
        )
        // Itinerary
        .route(
            "/api/trips/{id}/events",
            get(itinerary::list_events).post(itinerary::create_event),
        )
        .route("/api/trips/{id}/events/reorder", post(itinerary::reorder_events))
        .route(
            "/api/trips/{id}/events/{event_id}",
            get(itinerary::get_event)
                .patch(itinerary::update_event)
                .delete(itinerary::delete_event),
        )
        // Expenses and budget
        .route(
            "/api/trips/{id}/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route("/api/trips/{id}/expenses/summary", get(expenses::expense_summary))
        .route(
            "/api/trips/{id}/expenses/{expense_id}",
            patch(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route(
            "/api/trips/{id}/budget",
            get(expenses::get_budget).put(expenses::put_budget),
        )
        // Chat
        .route(
            "/api/trips/{id}/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        .route(
            "/api/trips/{id}/messages/{message_id}",
            delete(messages::delete_message),
        )
        // Ideas
        .route(
            "/api/trips/{id}/ideas",
            get(ideas::list_ideas).post(ideas::create_idea),
        )
        .route(
            "/api/trips/{id}/ideas/{idea_id}",
            patch(ideas::update_idea_status).delete(ideas::delete_idea),
        )
        .route("/api/trips/{id}/ideas/{idea_id}/vote", post(ideas::vote_idea))
        // Polls
        .route(
            "/api/trips/{id}/polls",
            get(polls::list_polls).post(polls::create_poll),
        )
        .route("/api/trips/{id}/polls/{poll_id}", get(polls::get_poll))
        .route("/api/trips/{id}/polls/{poll_id}/vote", post(polls::vote_poll))
        .route("/api/trips/{id}/polls/{poll_id}/close", post(polls::close_poll))
        // Activity and export
        .route("/api/trips/{id}/activity", get(activity::list_activity))
        .route("/api/trips/{id}/export/pdf", get(export::export_trip_pdf))
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", post(notifications::mark_read));

    let crm_routes = Router::new()
        .route(
            "/api/crm/clients",
            get(crm::list_clients).post(crm::create_client),
        )
        .route(
            "/api/crm/clients/{id}",
            get(crm::get_client)
                .patch(crm::update_client)
                .delete(crm::delete_client),
        )
        .route(
            "/api/crm/proposals",
            get(crm::list_proposals).post(crm::create_proposal),
        )
        .route(
            "/api/crm/proposals/{id}",
            get(crm::get_proposal)
                .patch(crm::update_proposal)
                .delete(crm::delete_proposal),
        )
        .route("/api/crm/proposals/{id}/send", post(crm::send_proposal))
        .route("/api/crm/proposals/{id}/respond", post(crm::respond_to_proposal))
        .route(
            "/api/crm/invoices",
            get(crm::list_invoices).post(crm::create_invoice),
        )
        .route(
            "/api/crm/invoices/{id}",
            get(crm::get_invoice)
                .patch(crm::update_invoice)
                .delete(crm::delete_invoice),
        )
        .route("/api/crm/invoices/{id}/send", post(crm::send_invoice))
        .route("/api/crm/invoices/{id}/mark-paid", post(crm::mark_invoice_paid))
        .route("/api/crm/invoices/{id}/cancel", post(crm::cancel_invoice))
        // Landing pages
        .route(
            "/api/landing-pages",
            get(landing_pages::list_pages).post(landing_pages::create_page),
        )
        .route(
            "/api/landing-pages/{id}",
            get(landing_pages::get_page)
                .patch(landing_pages::update_page)
                .delete(landing_pages::delete_page),
        )
        .route(
            "/api/landing-pages/{id}/publish",
            post(landing_pages::publish_page),
        )
        .route(
            "/api/landing-pages/{id}/unpublish",
            post(landing_pages::unpublish_page),
        );

    // Session cookies need credentialed CORS, which rules out `permissive()`
    Router::new()
        .merge(public_routes)
        .merge(trip_routes)
        .merge(crm_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
