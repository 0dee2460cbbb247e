//! Service and repository tests against PostgreSQL.
//!
//! Run with `DATABASE_URL` set: `cargo test -- --ignored`.

mod helpers;

use axum::http::{header, StatusCode};
use chrono::{Datelike, NaiveDate, Utc};
use helpers::*;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use uuid::Uuid;
use wanderplan::api::create_router;
use wanderplan::models::collaborator::{InviteCollaborator, UpdateCollaboratorRole};
use wanderplan::models::crm::{CreateClient, CreateInvoice, RespondToProposal, CreateProposal};
use wanderplan::models::event::{CreateEvent, EventPosition, ReorderEvents};
use wanderplan::models::budget::UpsertBudget;
use wanderplan::models::expense::CreateExpense;
use wanderplan::models::idea::CreateIdea;
use wanderplan::models::landing_page::CreateLandingPage;
use wanderplan::models::message::{CreateMessage, MessageQuery};
use wanderplan::models::poll::{CastVote, CreatePoll};
use wanderplan::models::trip::{CreateTrip, UpdateTrip};
use wanderplan::models::user::LoginRequest;
use wanderplan::models::{LineItem, Role, TripStatusFilter};
use wanderplan::pagination::PageQuery;
use wanderplan::repositories::TripListFilter;
use wanderplan::services::BulkTagRequest;
use wanderplan::services::TagMode;
use wanderplan::AppState;

fn trip_input(title: &str) -> CreateTrip {
    CreateTrip {
        title: title.to_string(),
        description: None,
        destination: Some("Lisbon".to_string()),
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 5),
        cover_image_url: None,
        tags: vec!["Beach".to_string()],
    }
}

fn event_input(title: &str, date: NaiveDate) -> CreateEvent {
    CreateEvent {
        title: title.to_string(),
        description: None,
        location: None,
        date,
        start_time: None,
        end_time: None,
        category: None,
        cost: None,
        currency: None,
    }
}

/// Owner plus an accepted collaborator with `role`
async fn shared_trip(state: &AppState, role: Role) -> (Uuid, Uuid, Uuid) {
    let owner = create_user(state, "Owner").await;
    let guest = create_user(state, "Guest").await;
    let trip = state.trips.create(owner.id, &trip_input("Shared")).await.unwrap();

    let invite = state
        .collaborators
        .invite(
            trip.trip.id,
            owner.id,
            &InviteCollaborator {
                email: guest.email.clone(),
                role,
            },
        )
        .await
        .unwrap();
    state.collaborators.respond(invite.id, guest.id, true).await.unwrap();

    (trip.trip.id, owner.id, guest.id)
}

// ============================================================================
// Schema
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_migrations_ran(pool: PgPool) {
    for table in ["users", "trips", "collaborators", "itinerary_events", "expenses", "invoices"] {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        let exists: bool = row.get(0);
        assert!(exists, "Table {} should exist", table);
    }
}

// ============================================================================
// Auth
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_register_and_login(pool: PgPool) {
    let state = test_state(pool);
    let user = create_user(&state, "Ana").await;

    let logged_in = state
        .auth
        .login(&LoginRequest {
            email: user.email.to_uppercase(),
            password: "correct horse battery".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let err = state
        .auth
        .login(&LoginRequest {
            email: user.email.clone(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 401);
}

// ============================================================================
// Trips
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_trip_lifecycle(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;

    let created = state.trips.create(owner.id, &trip_input("Lisbon")).await.unwrap();
    assert_eq!(created.trip.tags, vec!["beach".to_string()]);
    assert!(created.permissions.can_delete);

    let page = state
        .trips
        .list(owner.id, &TripListFilter::default(), &PageQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let updated = state
        .trips
        .update(
            created.trip.id,
            owner.id,
            &UpdateTrip {
                is_archived: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.trip.is_archived);

    let archived = TripListFilter {
        status: TripStatusFilter::Archived,
        ..Default::default()
    };
    let page = state.trips.list(owner.id, &archived, &PageQuery::default()).await.unwrap();
    assert_eq!(page.total, 1);

    state.trips.delete(created.trip.id, owner.id).await.unwrap();
    let err = state.trips.get(created.trip.id, owner.id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_archive_reports_each_trip(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let stranger = create_user(&state, "Stranger").await;

    let mine = state.trips.create(owner.id, &trip_input("Mine")).await.unwrap();
    let theirs = state.trips.create(stranger.id, &trip_input("Theirs")).await.unwrap();
    let missing = Uuid::new_v4();

    let summary = state
        .trips
        .bulk_archive(owner.id, &[mine.trip.id, theirs.trip.id, missing])
        .await
        .unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.archived, Some(1));
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.status_code(), 207);
    assert_eq!(summary.results[1].error.as_deref(), Some("Insufficient permissions"));
    assert_eq!(summary.results[2].error.as_deref(), Some("Trip not found"));

    let again = state.trips.bulk_archive(owner.id, &[mine.trip.id]).await.unwrap();
    assert!(again.success);
    assert_eq!(again.results[0].reason.as_deref(), Some("Already archived"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_tag_modes(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let trip = state.trips.create(owner.id, &trip_input("Tags")).await.unwrap();

    let request = BulkTagRequest {
        trip_ids: vec![trip.trip.id],
        tags: vec![" Food ".to_string(), "food".to_string()],
        mode: TagMode::Add,
    };
    let summary = state.trips.bulk_tag(owner.id, &request).await.unwrap();
    assert_eq!(summary.tagged, Some(1));

    let details = state.trips.get(trip.trip.id, owner.id).await.unwrap();
    assert_eq!(details.trip.tags, vec!["beach".to_string(), "food".to_string()]);
}

// ============================================================================
// Collaborators
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_invitation_flow_and_roles(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let guest = create_user(&state, "Guest").await;
    let trip = state.trips.create(owner.id, &trip_input("Trip")).await.unwrap();

    let invite = state
        .collaborators
        .invite(
            trip.trip.id,
            owner.id,
            &InviteCollaborator {
                email: guest.email.clone(),
                role: Role::Viewer,
            },
        )
        .await
        .unwrap();

    // Pending invitations grant nothing
    let err = state.trips.get(trip.trip.id, guest.id).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    let pending = state.collaborators.pending_invitations(guest.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(state.notifications.unread_count(guest.id).await.unwrap(), 1);

    state.collaborators.respond(invite.id, guest.id, true).await.unwrap();
    let err = state
        .collaborators
        .respond(invite.id, guest.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 410);

    let details = state.trips.get(trip.trip.id, guest.id).await.unwrap();
    assert!(details.permissions.can_view);
    assert!(!details.permissions.can_edit);

    let err = state
        .trips
        .update(
            trip.trip.id,
            guest.id,
            &UpdateTrip {
                title: Some("Mine now".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    // Promote, then the guest can edit
    state
        .collaborators
        .update_role(
            trip.trip.id,
            invite.id,
            owner.id,
            &UpdateCollaboratorRole { role: Role::Editor },
        )
        .await
        .unwrap();
    let details = state.trips.get(trip.trip.id, guest.id).await.unwrap();
    assert!(details.permissions.can_edit);

    // Duplicate invite and inviting the owner both conflict
    for email in [guest.email.clone(), owner.email.clone()] {
        let err = state
            .collaborators
            .invite(trip.trip.id, owner.id, &InviteCollaborator { email, role: Role::Viewer })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    // A collaborator may always leave
    state.collaborators.remove(trip.trip.id, invite.id, guest.id).await.unwrap();
    let err = state.trips.get(trip.trip.id, guest.id).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_declined_invitation_can_be_resent(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let guest = create_user(&state, "Guest").await;
    let trip = state.trips.create(owner.id, &trip_input("Trip")).await.unwrap();
    let invite_as = |role| InviteCollaborator {
        email: guest.email.clone(),
        role,
    };

    let first = state
        .collaborators
        .invite(trip.trip.id, owner.id, &invite_as(Role::Viewer))
        .await
        .unwrap();
    state.collaborators.respond(first.id, guest.id, false).await.unwrap();
    assert!(state.collaborators.pending_invitations(guest.id).await.unwrap().is_empty());

    let again = state
        .collaborators
        .invite(trip.trip.id, owner.id, &invite_as(Role::Editor))
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    assert!(again.is_pending());
    assert_eq!(again.role, "EDITOR");

    let pending = state.collaborators.pending_invitations(guest.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].role, "EDITOR");

    // Still pending, so a third invite conflicts
    let err = state
        .collaborators
        .invite(trip.trip.id, owner.id, &invite_as(Role::Viewer))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    state.collaborators.respond(again.id, guest.id, true).await.unwrap();
    let details = state.trips.get(trip.trip.id, guest.id).await.unwrap();
    assert!(details.permissions.can_edit);
}

// ============================================================================
// Itinerary
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_events_append_and_reorder(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let trip = state.trips.create(owner.id, &trip_input("Trip")).await.unwrap().trip;
    let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

    let first = state.itinerary.create(trip.id, owner.id, &event_input("Museum", day)).await.unwrap();
    let second = state.itinerary.create(trip.id, owner.id, &event_input("Dinner", day)).await.unwrap();
    assert_eq!(second.order_index, first.order_index + 1);

    let reordered = state
        .itinerary
        .reorder(
            trip.id,
            owner.id,
            &ReorderEvents {
                items: vec![
                    EventPosition { id: first.id, order_index: 1, date: None },
                    EventPosition { id: second.id, order_index: 0, date: None },
                ],
            },
        )
        .await
        .unwrap();
    let titles: Vec<&str> = reordered.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Dinner", "Museum"]);

    // A foreign ID rejects the whole batch
    let err = state
        .itinerary
        .reorder(
            trip.id,
            owner.id,
            &ReorderEvents {
                items: vec![
                    EventPosition { id: first.id, order_index: 0, date: None },
                    EventPosition { id: Uuid::new_v4(), order_index: 1, date: None },
                ],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let unchanged = state.itinerary.list(trip.id, owner.id, Some(day)).await.unwrap();
    assert_eq!(unchanged[0].title, "Dinner");
}

// ============================================================================
// Expenses
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_expense_summary_settles_up(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, guest_id) = shared_trip(&state, Role::Editor).await;
    let date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

    state
        .expenses
        .create(
            trip_id,
            owner_id,
            &CreateExpense {
                description: "Hotel".to_string(),
                amount: Decimal::new(10_000, 2),
                currency: Some("EUR".to_string()),
                category: Some("lodging".to_string()),
                date,
                paid_by: None,
                split_among: vec![],
            },
        )
        .await
        .unwrap();

    let err = state
        .expenses
        .create(
            trip_id,
            owner_id,
            &CreateExpense {
                description: "Taxi".to_string(),
                amount: Decimal::new(2_000, 2),
                currency: Some("EUR".to_string()),
                category: None,
                date,
                paid_by: Some(Uuid::new_v4()),
                split_among: vec![],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let summary = state.expenses.summary(trip_id, guest_id).await.unwrap();
    assert_eq!(summary.total, Decimal::new(10_000, 2));
    assert_eq!(summary.settlements.len(), 1);
    assert_eq!(summary.settlements[0].from, guest_id);
    assert_eq!(summary.settlements[0].to, owner_id);
    assert_eq!(summary.settlements[0].amount, Decimal::new(5_000, 2));
}

// ============================================================================
// Polls
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_poll_voting_and_closing(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, guest_id) = shared_trip(&state, Role::Viewer).await;

    let poll = state
        .polls
        .create(
            trip_id,
            guest_id,
            &CreatePoll {
                question: "Where to eat?".to_string(),
                options: vec!["Tapas".to_string(), "Sushi".to_string()],
                allow_multiple: false,
                closes_at: None,
            },
        )
        .await
        .unwrap();
    let tapas = poll.options[0].id;
    let sushi = poll.options[1].id;

    let err = state
        .polls
        .vote(trip_id, poll.poll.id, owner_id, &CastVote { option_ids: vec![tapas, sushi] })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    state
        .polls
        .vote(trip_id, poll.poll.id, owner_id, &CastVote { option_ids: vec![tapas] })
        .await
        .unwrap();
    let results = state
        .polls
        .vote(trip_id, poll.poll.id, owner_id, &CastVote { option_ids: vec![sushi] })
        .await
        .unwrap();
    assert_eq!(results.total_votes, 1);
    assert_eq!(results.my_votes, vec![sushi]);

    let closed = state.polls.close(trip_id, poll.poll.id, guest_id).await.unwrap();
    assert!(closed.is_closed);

    let err = state
        .polls
        .vote(trip_id, poll.poll.id, guest_id, &CastVote { option_ids: vec![tapas] })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 410);
}

// ============================================================================
// CRM
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_invoice_numbers_and_totals(pool: PgPool) {
    let state = test_state(pool);
    let agent = create_user(&state, "Agent").await;
    let client = state
        .crm
        .create_client(
            agent.id,
            &CreateClient {
                name: "Acme Travel".to_string(),
                email: Some("ops@acme.example".to_string()),
                phone: None,
                company: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let input = CreateInvoice {
        client_id: client.id,
        trip_id: None,
        line_items: vec![
            LineItem {
                description: "Guide".to_string(),
                quantity: Decimal::new(2, 0),
                unit_price: Decimal::new(4_950, 2),
            },
            LineItem {
                description: "Transfer".to_string(),
                quantity: Decimal::ONE,
                unit_price: Decimal::new(2_000, 2),
            },
        ],
        tax_rate: Decimal::new(10, 0),
        currency: Some("EUR".to_string()),
        issue_date: None,
        due_date: None,
        notes: None,
    };

    let first = state.crm.create_invoice(agent.id, &input).await.unwrap();
    let second = state.crm.create_invoice(agent.id, &input).await.unwrap();
    let year = Utc::now().year();
    assert_eq!(first.number, format!("INV-{}-0001", year));
    assert_eq!(second.number, format!("INV-{}-0002", year));
    assert_eq!(first.subtotal, Decimal::new(11_900, 2));
    assert_eq!(first.tax_amount, Decimal::new(1_190, 2));
    assert_eq!(first.total, Decimal::new(13_090, 2));

    let sent = state.crm.send_invoice(agent.id, first.id).await.unwrap();
    assert_eq!(sent.status, "SENT");
    let err = state.crm.delete_invoice(agent.id, first.id).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    // Another user cannot see the invoice at all
    let other = create_user(&state, "Other").await;
    let err = state.crm.get_invoice(other.id, first.id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_proposal_state_machine(pool: PgPool) {
    let state = test_state(pool);
    let agent = create_user(&state, "Agent").await;
    let client = state
        .crm
        .create_client(
            agent.id,
            &CreateClient {
                name: "Rivera family".to_string(),
                email: None,
                phone: None,
                company: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let proposal = state
        .crm
        .create_proposal(
            agent.id,
            &CreateProposal {
                client_id: client.id,
                trip_id: None,
                title: "Azores week".to_string(),
                content: "Seven nights".to_string(),
                total_amount: Decimal::new(250_000, 2),
                currency: Some("EUR".to_string()),
                valid_until: None,
            },
        )
        .await
        .unwrap();

    let err = state
        .crm
        .respond_to_proposal(agent.id, proposal.id, &RespondToProposal { accepted: true })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    state.crm.send_proposal(agent.id, proposal.id).await.unwrap();
    let err = state.crm.send_proposal(agent.id, proposal.id).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    let accepted = state
        .crm
        .respond_to_proposal(agent.id, proposal.id, &RespondToProposal { accepted: true })
        .await
        .unwrap();
    assert_eq!(accepted.status, "ACCEPTED");
}

// ============================================================================
// Landing pages
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_landing_page_publishing(pool: PgPool) {
    let state = test_state(pool);
    let agent = create_user(&state, "Agent").await;
    let input = CreateLandingPage {
        title: "Summer in Porto".to_string(),
        slug: "summer-in-porto".to_string(),
        trip_id: None,
        content: json!([{ "type": "heading", "text": "Porto" }]),
        theme: None,
    };

    let page = state.landing_pages.create(agent.id, &input).await.unwrap();
    let err = state.landing_pages.create(agent.id, &input).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    let err = state.landing_pages.public("summer-in-porto").await.unwrap_err();
    assert_eq!(err.status_code(), 404);

    state.landing_pages.set_published(agent.id, page.id, true).await.unwrap();
    let public = state.landing_pages.public("summer-in-porto").await.unwrap();
    assert_eq!(public.id, page.id);
}

// ============================================================================
// Budget
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_budget_limits_fit_the_total(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, viewer_id) = shared_trip(&state, Role::Viewer).await;

    let err = state.expenses.get_budget(trip_id, owner_id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);

    let mut categories = BTreeMap::new();
    categories.insert("FOOD".to_string(), Decimal::new(600, 0));
    categories.insert("LODGING".to_string(), Decimal::new(500, 0));
    let over = UpsertBudget {
        total: Decimal::new(1_000, 0),
        currency: Some("EUR".to_string()),
        categories: categories.clone(),
    };
    let err = state.expenses.put_budget(trip_id, owner_id, &over).await.unwrap_err();
    assert_eq!(err.status_code(), 400);

    categories.insert("LODGING".to_string(), Decimal::new(400, 0));
    let fits = UpsertBudget { categories, ..over };
    let err = state.expenses.put_budget(trip_id, viewer_id, &fits).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    state.expenses.put_budget(trip_id, owner_id, &fits).await.unwrap();
    let budget = state.expenses.get_budget(trip_id, viewer_id).await.unwrap();
    assert_eq!(budget.total, Decimal::new(1_000, 0));
    assert_eq!(budget.currency, "EUR");
    assert_eq!(budget.categories["LODGING"], json!("400"));
}

// ============================================================================
// Messages
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_messages_page_backwards_and_delete(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, viewer_id) = shared_trip(&state, Role::Viewer).await;

    for (author, content) in [(owner_id, "first"), (viewer_id, "second"), (owner_id, "third")] {
        state
            .messages
            .post(trip_id, author, &CreateMessage { content: content.to_string() })
            .await
            .unwrap();
    }
    let err = state
        .messages
        .post(trip_id, owner_id, &CreateMessage { content: "   ".to_string() })
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let newest = state
        .messages
        .list(trip_id, viewer_id, &MessageQuery { before: None, limit: Some(2) })
        .await
        .unwrap();
    let contents: Vec<_> = newest.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["third", "second"]);

    let older = state
        .messages
        .list(
            trip_id,
            viewer_id,
            &MessageQuery { before: Some(newest[1].created_at), limit: Some(2) },
        )
        .await
        .unwrap();
    assert_eq!(older.len(), 1);
    assert_eq!(older[0].content, "first");

    // A viewer may not delete someone else's message
    let err = state.messages.delete(trip_id, newest[0].id, viewer_id).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    // Authors delete their own, the owner deletes anyone's
    state.messages.delete(trip_id, newest[0].id, owner_id).await.unwrap();
    state.messages.delete(trip_id, newest[1].id, owner_id).await.unwrap();
    let err = state.messages.delete(trip_id, newest[1].id, owner_id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);

    let remaining = state
        .messages
        .list(trip_id, owner_id, &MessageQuery::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].author_id, owner_id);
}

// ============================================================================
// Ideas
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_idea_vote_toggles(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, viewer_id) = shared_trip(&state, Role::Viewer).await;

    let idea = state
        .ideas
        .create(
            trip_id,
            owner_id,
            &CreateIdea {
                title: "Sunset sail".to_string(),
                description: None,
                url: Some("https://example.com/sail".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(idea.votes, 0);

    let voted = state.ideas.toggle_vote(trip_id, idea.id, viewer_id).await.unwrap();
    assert_eq!(voted.votes, 1);
    assert!(voted.voted_by_me);

    let seen_by_owner = state.ideas.list(trip_id, owner_id).await.unwrap();
    assert_eq!(seen_by_owner[0].votes, 1);
    assert!(!seen_by_owner[0].voted_by_me);

    let unvoted = state.ideas.toggle_vote(trip_id, idea.id, viewer_id).await.unwrap();
    assert_eq!(unvoted.votes, 0);
    assert!(!unvoted.voted_by_me);

    let err = state.ideas.toggle_vote(trip_id, Uuid::new_v4(), viewer_id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// ============================================================================
// Notifications and activity
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_notifications_unread_and_read_all(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let guest = create_user(&state, "Guest").await;
    for title in ["Porto", "Madeira", "Azores"] {
        let trip = state.trips.create(owner.id, &trip_input(title)).await.unwrap();
        state
            .collaborators
            .invite(
                trip.trip.id,
                owner.id,
                &InviteCollaborator {
                    email: guest.email.clone(),
                    role: Role::Viewer,
                },
            )
            .await
            .unwrap();
    }
    assert_eq!(state.notifications.unread_count(guest.id).await.unwrap(), 3);

    let page = state
        .notifications
        .list(guest.id, true, &PageQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0].kind, "trip_invitation");

    state.notifications.mark_read(guest.id, page.items[0].id).await.unwrap();
    assert_eq!(state.notifications.unread_count(guest.id).await.unwrap(), 2);

    // Someone else's notification is not found
    let err = state
        .notifications
        .mark_read(owner.id, page.items[1].id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    assert_eq!(state.notifications.mark_all_read(guest.id).await.unwrap(), 2);
    assert_eq!(state.notifications.unread_count(guest.id).await.unwrap(), 0);
    let all = state
        .notifications
        .list(guest.id, false, &PageQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    assert!(all.items.iter().all(|n| n.read_at.is_some()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_activity_feed_records_mutations(pool: PgPool) {
    let state = test_state(pool);
    let owner = create_user(&state, "Owner").await;
    let trip = state.trips.create(owner.id, &trip_input("Feed")).await.unwrap().trip;
    let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    state.itinerary.create(trip.id, owner.id, &event_input("Tram 28", day)).await.unwrap();

    let feed = state.activity.list(trip.id, &PageQuery::default()).await.unwrap();
    assert_eq!(feed.total, 2);
    let kinds: Vec<_> = feed.items.iter().map(|a| a.kind.as_str()).collect();
    assert!(kinds.contains(&"trip_created"));
    assert!(kinds.contains(&"event_created"));
    assert!(feed.items.iter().all(|a| a.actor_id == Some(owner.id)));
}

// ============================================================================
// Export
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_pdf_export_through_router(pool: PgPool) {
    let state = test_state(pool);
    let (trip_id, owner_id, _) = shared_trip(&state, Role::Viewer).await;
    let day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    state.itinerary.create(trip_id, owner_id, &event_input("Belem Tower", day)).await.unwrap();
    let app = create_router(state.clone());

    let uri = format!("/api/trips/{}/export/pdf", trip_id);
    let response = send(&app, get_request(&uri, Some(&bearer(&state, owner_id)))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"shared-itinerary.pdf\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));

    // Outsiders get 403, anonymous callers 401
    let stranger = create_user(&state, "Stranger").await;
    let response = send(&app, get_request(&uri, Some(&bearer(&state, stranger.id)))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = send(&app, get_request(&uri, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
