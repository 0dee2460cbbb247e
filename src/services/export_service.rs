use super::AccessService;
use crate::error::AppResult;
use crate::export::{self, ItineraryExport};
use crate::permissions::Permission;
use crate::repositories::{BudgetRepository, EventRepository, ExpenseRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Rendered file ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub content_disposition: String,
    pub bytes: Vec<u8>,
}

pub struct ExportService {
    event_repo: Arc<EventRepository>,
    expense_repo: Arc<ExpenseRepository>,
    budget_repo: Arc<BudgetRepository>,
    access: Arc<AccessService>,
}

impl ExportService {
    pub fn new(
        event_repo: Arc<EventRepository>,
        expense_repo: Arc<ExpenseRepository>,
        budget_repo: Arc<BudgetRepository>,
        access: Arc<AccessService>,
    ) -> Self {
        Self {
            event_repo,
            expense_repo,
            budget_repo,
            access,
        }
    }

    /// Itinerary PDF for a trip the caller can view
    pub async fn trip_pdf(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<ExportedFile> {
        let (trip, _) = self.access.require(trip_id, user_id, Permission::View).await?;

        let events = self.event_repo.list_for_trip(trip_id, None).await?;
        let expense_total: Decimal = self
            .expense_repo
            .all_for_trip(trip_id)
            .await?
            .iter()
            .map(|e| e.amount)
            .sum();
        let budget = self.budget_repo.find_for_trip(trip_id).await?;

        let bytes = export::render(&ItineraryExport {
            trip: &trip,
            events: &events,
            expense_total,
            budget: budget.as_ref(),
        });
        info!(
            "Exported itinerary for trip {} ({} events, {} bytes)",
            trip_id,
            events.len(),
            bytes.len()
        );

        Ok(ExportedFile {
            content_disposition: export::content_disposition(&trip.title),
            bytes,
        })
    }
}
