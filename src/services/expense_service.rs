use super::activity::{kinds, ActivityService};
use super::settlement::{compute_summary, ExpenseSummary};
use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::budget::UpsertBudget;
use crate::models::expense::{CreateExpense, ExpenseQuery, UpdateExpense};
use crate::models::{Budget, Expense};
use crate::pagination::{Page, PageQuery};
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::{BudgetRepository, CollaboratorRepository, ExpenseRepository};
use crate::validation::{Validate, Validator};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for trip expenses, the budget and the settle-up summary
pub struct ExpenseService {
    expense_repo: Arc<ExpenseRepository>,
    budget_repo: Arc<BudgetRepository>,
    collaborator_repo: Arc<CollaboratorRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    emitter: RelayEmitter,
}

impl ExpenseService {
    pub fn new(
        expense_repo: Arc<ExpenseRepository>,
        budget_repo: Arc<BudgetRepository>,
        collaborator_repo: Arc<CollaboratorRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            expense_repo,
            budget_repo,
            collaborator_repo,
            access,
            activity,
            emitter,
        }
    }

    pub async fn list(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        query: &ExpenseQuery,
    ) -> AppResult<Page<Expense>> {
        self.access.require(trip_id, user_id, Permission::View).await?;

        let page = PageQuery {
            page: query.page,
            limit: query.limit,
        };
        let category = query.category.as_deref();
        let items = self
            .expense_repo
            .list_for_trip(trip_id, category, page.limit(), page.offset())
            .await?;
        let total = self.expense_repo.count_for_trip(trip_id, category).await?;
        Ok(Page::new(items, &page, total))
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &CreateExpense,
    ) -> AppResult<Expense> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        self.check_members(trip_id, input.paid_by, Some(&input.split_among))
            .await?;

        let expense = self.expense_repo.create(trip_id, user_id, input).await?;
        info!(
            "Recorded expense {} of {} {} on trip {}",
            expense.id, expense.amount, expense.currency, trip_id
        );

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EXPENSE_CREATED,
                format!(
                    "Added expense \"{}\" ({} {})",
                    expense.description, expense.amount, expense.currency
                ),
                json!({ "expenseId": expense.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "created", "expense": &expense }));

        Ok(expense)
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        expense_id: Uuid,
        user_id: Uuid,
        changes: &UpdateExpense,
    ) -> AppResult<Expense> {
        changes.validate()?;
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        self.find(trip_id, expense_id).await?;
        self.check_members(trip_id, changes.paid_by, changes.split_among.as_deref())
            .await?;

        let expense = self
            .expense_repo
            .update(trip_id, expense_id, changes)
            .await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EXPENSE_UPDATED,
                format!("Updated expense \"{}\"", expense.description),
                json!({ "expenseId": expense.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "updated", "expense": &expense }));

        Ok(expense)
    }

    pub async fn delete(&self, trip_id: Uuid, expense_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        let expense = self.find(trip_id, expense_id).await?;

        if !self.expense_repo.soft_delete(trip_id, expense_id).await? {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EXPENSE_DELETED,
                format!("Removed expense \"{}\"", expense.description),
                json!({ "expenseId": expense_id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "deleted", "expenseId": expense_id }));
        Ok(())
    }

    pub async fn summary(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<ExpenseSummary> {
        self.access.require(trip_id, user_id, Permission::View).await?;

        let expenses = self.expense_repo.all_for_trip(trip_id).await?;
        let budget = self.budget_repo.find_for_trip(trip_id).await?;
        let members = self.collaborator_repo.member_ids(trip_id).await?;

        Ok(compute_summary(&expenses, budget.as_ref(), &members))
    }

    pub async fn get_budget(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<Budget> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        self.budget_repo
            .find_for_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Budget not set".to_string()))
    }

    pub async fn put_budget(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &UpsertBudget,
    ) -> AppResult<Budget> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::Edit).await?;

        let budget = self.budget_repo.upsert(trip_id, input).await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::BUDGET_UPDATED,
                format!("Set the budget to {} {}", budget.total, budget.currency),
                json!({ "budgetId": budget.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "budget-updated", "budget": &budget }));

        Ok(budget)
    }

    /// Payer and split participants must be the owner or accepted collaborators
    async fn check_members(
        &self,
        trip_id: Uuid,
        paid_by: Option<Uuid>,
        split_among: Option<&[Uuid]>,
    ) -> AppResult<()> {
        let split_among = split_among.unwrap_or_default();
        if paid_by.is_none() && split_among.is_empty() {
            return Ok(());
        }

        let members = self.collaborator_repo.member_ids(trip_id).await?;
        let mut v = Validator::new();
        if let Some(payer) = paid_by {
            v.check(members.contains(&payer), "paidBy", "Must be a trip member");
        }
        v.check(
            split_among.iter().all(|id| members.contains(id)),
            "splitAmong",
            "Every participant must be a trip member",
        );
        v.finish()
    }

    async fn find(&self, trip_id: Uuid, expense_id: Uuid) -> AppResult<Expense> {
        self.expense_repo
            .find(trip_id, expense_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
    }

    fn emit(&self, trip_id: Uuid, data: serde_json::Value) {
        self.emitter.emit(trip_id, RelayEvent::ExpenseUpdated, data);
    }
}
