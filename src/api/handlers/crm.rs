//! Per-user CRM: clients, proposals and invoices. Every lookup is scoped to the caller.

use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::crm::{
    CreateClient, CreateInvoice, CreateProposal, CrmQuery, RespondToProposal, UpdateClient,
    UpdateInvoice, UpdateProposal,
};
use crate::models::{CrmClient, Invoice, Proposal};
use crate::pagination::Page;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

// Clients

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<CrmQuery>,
) -> AppResult<Json<Page<CrmClient>>> {
    Ok(Json(state.crm.list_clients(user.id, &query).await?))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateClient>,
) -> AppResult<(StatusCode, Json<CrmClient>)> {
    Ok(created(state.crm.create_client(user.id, &body).await?))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CrmClient>> {
    Ok(Json(state.crm.get_client(user.id, id).await?))
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateClient>,
) -> AppResult<Json<CrmClient>> {
    Ok(Json(state.crm.update_client(user.id, id, &body).await?))
}

pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.crm.delete_client(user.id, id).await?;
    Ok(success())
}

// Proposals

pub async fn list_proposals(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<CrmQuery>,
) -> AppResult<Json<Page<Proposal>>> {
    Ok(Json(state.crm.list_proposals(user.id, &query).await?))
}

pub async fn create_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateProposal>,
) -> AppResult<(StatusCode, Json<Proposal>)> {
    Ok(created(state.crm.create_proposal(user.id, &body).await?))
}

pub async fn get_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Proposal>> {
    Ok(Json(state.crm.get_proposal(user.id, id).await?))
}

pub async fn update_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateProposal>,
) -> AppResult<Json<Proposal>> {
    Ok(Json(state.crm.update_proposal(user.id, id, &body).await?))
}

pub async fn delete_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.crm.delete_proposal(user.id, id).await?;
    Ok(success())
}

pub async fn send_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Proposal>> {
    Ok(Json(state.crm.send_proposal(user.id, id).await?))
}

pub async fn respond_to_proposal(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<RespondToProposal>,
) -> AppResult<Json<Proposal>> {
    Ok(Json(state.crm.respond_to_proposal(user.id, id, &body).await?))
}

// Invoices

pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<CrmQuery>,
) -> AppResult<Json<Page<Invoice>>> {
    Ok(Json(state.crm.list_invoices(user.id, &query).await?))
}

pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateInvoice>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    Ok(created(state.crm.create_invoice(user.id, &body).await?))
}

pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.crm.get_invoice(user.id, id).await?))
}

pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateInvoice>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.crm.update_invoice(user.id, id, &body).await?))
}

pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.crm.delete_invoice(user.id, id).await?;
    Ok(success())
}

pub async fn send_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.crm.send_invoice(user.id, id).await?))
}

pub async fn mark_invoice_paid(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.crm.mark_invoice_paid(user.id, id).await?))
}

pub async fn cancel_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.crm.cancel_invoice(user.id, id).await?))
}
