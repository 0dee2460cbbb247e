//! Per-planner CRM: clients, proposals and invoices.
//!
//! Every record is scoped to its owner; another user's record is reported as
//! not found rather than forbidden.

use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::crm::{
    CreateClient, CreateInvoice, CreateProposal, CrmQuery, RespondToProposal, UpdateClient,
    UpdateInvoice, UpdateProposal,
};
use crate::models::{
    CrmClient, Invoice, InvoiceStatus, InvoiceTotals, LineItem, Proposal, ProposalStatus,
};
use crate::pagination::Page;
use crate::permissions::Permission;
use crate::repositories::{ClientRepository, InvoiceDraft, InvoiceRepository, ProposalRepository};
use crate::validation::Validate;
use chrono::{NaiveDate, Utc};
use tracing::info;
use std::sync::Arc;
use uuid::Uuid;

pub struct CrmService {
    client_repo: Arc<ClientRepository>,
    proposal_repo: Arc<ProposalRepository>,
    invoice_repo: Arc<InvoiceRepository>,
    access: Arc<AccessService>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl CrmService {
    pub fn new(
        client_repo: Arc<ClientRepository>,
        proposal_repo: Arc<ProposalRepository>,
        invoice_repo: Arc<InvoiceRepository>,
        access: Arc<AccessService>,
    ) -> Self {
        Self {
            client_repo,
            proposal_repo,
            invoice_repo,
            access,
        }
    }

    // Clients

    pub async fn list_clients(&self, owner_id: Uuid, query: &CrmQuery) -> AppResult<Page<CrmClient>> {
        let page = query.page_query();
        let items = self
            .client_repo
            .list(owner_id, query.search(), page.limit(), page.offset())
            .await?;
        let total = self.client_repo.count(owner_id, query.search()).await?;
        Ok(Page::new(items, &page, total))
    }

    pub async fn get_client(&self, owner_id: Uuid, id: Uuid) -> AppResult<CrmClient> {
        self.client_repo
            .find(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
    }

    pub async fn create_client(&self, owner_id: Uuid, input: &CreateClient) -> AppResult<CrmClient> {
        input.validate()?;
        let client = self.client_repo.create(owner_id, input).await?;
        info!("Created CRM client {} for {}", client.id, owner_id);
        Ok(client)
    }

    pub async fn update_client(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateClient,
    ) -> AppResult<CrmClient> {
        changes.validate()?;
        self.get_client(owner_id, id).await?;
        Ok(self.client_repo.update(owner_id, id, changes).await?)
    }

    pub async fn delete_client(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.client_repo.soft_delete(owner_id, id).await? {
            return Err(AppError::NotFound("Client not found".to_string()));
        }
        Ok(())
    }

    // Proposals

    pub async fn list_proposals(&self, owner_id: Uuid, query: &CrmQuery) -> AppResult<Page<Proposal>> {
        let page = query.page_query();
        let items = self
            .proposal_repo
            .list(owner_id, query.client_id, page.limit(), page.offset())
            .await?;
        let total = self.proposal_repo.count(owner_id, query.client_id).await?;
        Ok(Page::new(items, &page, total))
    }

    pub async fn get_proposal(&self, owner_id: Uuid, id: Uuid) -> AppResult<Proposal> {
        self.proposal_repo
            .find(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Proposal not found".to_string()))
    }

    pub async fn create_proposal(&self, owner_id: Uuid, input: &CreateProposal) -> AppResult<Proposal> {
        input.validate()?;
        self.get_client(owner_id, input.client_id).await?;
        self.check_trip(owner_id, input.trip_id).await?;

        let proposal = self.proposal_repo.create(owner_id, input).await?;
        info!("Created proposal {} for client {}", proposal.id, proposal.client_id);
        Ok(proposal)
    }

    /// Only drafts can be edited
    pub async fn update_proposal(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateProposal,
    ) -> AppResult<Proposal> {
        changes.validate()?;
        self.get_proposal(owner_id, id).await?;
        self.check_trip(owner_id, changes.trip_id).await?;

        self.proposal_repo
            .update_draft(owner_id, id, changes)
            .await?
            .ok_or_else(|| AppError::Conflict("Only draft proposals can be edited".to_string()))
    }

    pub async fn delete_proposal(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.proposal_repo.soft_delete(owner_id, id).await? {
            return Err(AppError::NotFound("Proposal not found".to_string()));
        }
        Ok(())
    }

    pub async fn send_proposal(&self, owner_id: Uuid, id: Uuid) -> AppResult<Proposal> {
        self.get_proposal(owner_id, id).await?;
        let proposal = self
            .proposal_repo
            .transition(owner_id, id, ProposalStatus::Draft, ProposalStatus::Sent)
            .await?
            .ok_or_else(|| AppError::Conflict("Only draft proposals can be sent".to_string()))?;
        info!("Proposal {} sent", id);
        Ok(proposal)
    }

    /// Record the client's answer to a sent proposal
    pub async fn respond_to_proposal(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &RespondToProposal,
    ) -> AppResult<Proposal> {
        self.get_proposal(owner_id, id).await?;
        let to = if input.accepted {
            ProposalStatus::Accepted
        } else {
            ProposalStatus::Declined
        };
        let proposal = self
            .proposal_repo
            .transition(owner_id, id, ProposalStatus::Sent, to)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Only sent proposals can be responded to".to_string())
            })?;
        info!("Proposal {} marked {}", id, to.as_str());
        Ok(proposal)
    }

    // Invoices

    pub async fn list_invoices(&self, owner_id: Uuid, query: &CrmQuery) -> AppResult<Page<Invoice>> {
        let page = query.page_query();
        let today = today();
        let items = self
            .invoice_repo
            .list(owner_id, query.client_id, page.limit(), page.offset())
            .await?
            .into_iter()
            .map(|invoice| invoice.with_effective_status(today))
            .collect();
        let total = self.invoice_repo.count(owner_id, query.client_id).await?;
        Ok(Page::new(items, &page, total))
    }

    pub async fn get_invoice(&self, owner_id: Uuid, id: Uuid) -> AppResult<Invoice> {
        Ok(self.find_invoice(owner_id, id).await?.with_effective_status(today()))
    }

    pub async fn create_invoice(&self, owner_id: Uuid, input: &CreateInvoice) -> AppResult<Invoice> {
        input.validate()?;
        self.get_client(owner_id, input.client_id).await?;
        self.check_trip(owner_id, input.trip_id).await?;

        let draft = InvoiceDraft {
            client_id: input.client_id,
            trip_id: input.trip_id,
            line_items: serde_json::to_value(&input.line_items)?,
            tax_rate: input.tax_rate,
            totals: InvoiceTotals::compute(&input.line_items, input.tax_rate)?,
            currency: input.currency.clone().unwrap_or_else(|| "USD".to_string()),
            issue_date: input.issue_date.unwrap_or_else(today),
            due_date: input.due_date,
            notes: input.notes.clone(),
        };
        let invoice = self.invoice_repo.create(owner_id, &draft).await?;
        info!(
            "Created invoice {} ({}) total {} {}",
            invoice.id, invoice.number, invoice.total, invoice.currency
        );
        Ok(invoice)
    }

    /// Rewrite a draft invoice, recomputing its totals
    pub async fn update_invoice(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateInvoice,
    ) -> AppResult<Invoice> {
        changes.validate()?;
        let current = self.find_invoice(owner_id, id).await?;
        if current.status_enum() != InvoiceStatus::Draft {
            return Err(AppError::Conflict("Only draft invoices can be edited".to_string()));
        }

        let line_items: Vec<LineItem> = match &changes.line_items {
            Some(items) => items.clone(),
            None => serde_json::from_value(current.line_items.clone())?,
        };
        let tax_rate = changes.tax_rate.unwrap_or(current.tax_rate);
        let due_date = changes.due_date.or(current.due_date);
        if let Some(due) = due_date {
            if due < current.issue_date {
                return Err(AppError::invalid_field(
                    "dueDate",
                    "Due date must be on or after issue date",
                ));
            }
        }

        let draft = InvoiceDraft {
            client_id: current.client_id,
            trip_id: current.trip_id,
            line_items: serde_json::to_value(&line_items)?,
            tax_rate,
            totals: InvoiceTotals::compute(&line_items, tax_rate)?,
            currency: changes.currency.clone().unwrap_or(current.currency),
            issue_date: current.issue_date,
            due_date,
            notes: changes.notes.clone().or(current.notes),
        };
        self.invoice_repo
            .update_draft(owner_id, id, &draft)
            .await?
            .ok_or_else(|| AppError::Conflict("Only draft invoices can be edited".to_string()))
    }

    /// Drafts may be deleted; anything issued must be cancelled instead
    pub async fn delete_invoice(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let invoice = self.find_invoice(owner_id, id).await?;
        if invoice.status_enum() != InvoiceStatus::Draft
            || !self.invoice_repo.soft_delete(owner_id, id).await?
        {
            return Err(AppError::Conflict(
                "Only draft invoices can be deleted".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn send_invoice(&self, owner_id: Uuid, id: Uuid) -> AppResult<Invoice> {
        self.transition_invoice(owner_id, id, &[InvoiceStatus::Draft], InvoiceStatus::Sent)
            .await
    }

    pub async fn mark_invoice_paid(&self, owner_id: Uuid, id: Uuid) -> AppResult<Invoice> {
        self.transition_invoice(
            owner_id,
            id,
            &[InvoiceStatus::Sent, InvoiceStatus::Overdue],
            InvoiceStatus::Paid,
        )
        .await
    }

    pub async fn cancel_invoice(&self, owner_id: Uuid, id: Uuid) -> AppResult<Invoice> {
        self.transition_invoice(
            owner_id,
            id,
            &[InvoiceStatus::Draft, InvoiceStatus::Sent, InvoiceStatus::Overdue],
            InvoiceStatus::Cancelled,
        )
        .await
    }

    async fn transition_invoice(
        &self,
        owner_id: Uuid,
        id: Uuid,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
    ) -> AppResult<Invoice> {
        let current = self.find_invoice(owner_id, id).await?;
        let invoice = self
            .invoice_repo
            .transition(owner_id, id, from, to)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Cannot mark a {} invoice as {}",
                    current.status_enum().as_str().to_lowercase(),
                    to.as_str().to_lowercase()
                ))
            })?;
        info!("Invoice {} moved to {}", invoice.number, to.as_str());
        Ok(invoice.with_effective_status(today()))
    }

    async fn find_invoice(&self, owner_id: Uuid, id: Uuid) -> AppResult<Invoice> {
        self.invoice_repo
            .find(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))
    }

    /// A linked trip must be one the owner can see
    async fn check_trip(&self, owner_id: Uuid, trip_id: Option<Uuid>) -> AppResult<()> {
        if let Some(trip_id) = trip_id {
            self.access.require(trip_id, owner_id, Permission::View).await?;
        }
        Ok(())
    }
}
