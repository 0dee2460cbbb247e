use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::budget::UpsertBudget;
use crate::models::expense::{CreateExpense, ExpenseQuery, UpdateExpense};
use crate::models::{Budget, Expense};
use crate::pagination::Page;
use crate::services::ExpenseSummary;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<ExpenseQuery>,
) -> AppResult<Json<Page<Expense>>> {
    Ok(Json(state.expenses.list(trip_id, user.id, &query).await?))
}

pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<CreateExpense>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    Ok(created(state.expenses.create(trip_id, user.id, &body).await?))
}

pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, expense_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateExpense>,
) -> AppResult<Json<Expense>> {
    Ok(Json(
        state
            .expenses
            .update(trip_id, expense_id, user.id, &body)
            .await?,
    ))
}

pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, expense_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state.expenses.delete(trip_id, expense_id, user.id).await?;
    Ok(success())
}

/// Totals, budget usage, balances and settle-up transfers
pub async fn expense_summary(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<ExpenseSummary>> {
    Ok(Json(state.expenses.summary(trip_id, user.id).await?))
}

pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Budget>> {
    Ok(Json(state.expenses.get_budget(trip_id, user.id).await?))
}

pub async fn put_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<UpsertBudget>,
) -> AppResult<Json<Budget>> {
    Ok(Json(state.expenses.put_budget(trip_id, user.id, &body).await?))
}
