//! CRM records owned by a single planner: clients, proposals and invoices.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::pagination::PageQuery;
use crate::validation::{Validate, Validator, MAX_MONEY};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CrmClient {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Proposal lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

impl ProposalStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(ProposalStatus::Draft),
            "SENT" => Ok(ProposalStatus::Sent),
            "ACCEPTED" => Ok(ProposalStatus::Accepted),
            "DECLINED" => Ok(ProposalStatus::Declined),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Sent => "SENT",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Declined => "DECLINED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub valid_until: Option<NaiveDate>,
    pub sent_at: Option<NaiveDateTime>,
    pub responded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Proposal {
    pub fn status_enum(&self) -> ProposalStatus {
        ProposalStatus::from_str(&self.status).unwrap_or(ProposalStatus::Draft)
    }
}

/// Invoice lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "SENT" => Ok(InvoiceStatus::Sent),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl LineItem {
    /// `None` when the product does not fit a `Decimal`
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price).map(round_cents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// Totals for `items` at `tax_rate` percent, each step rounded to cents.
    ///
    /// Fails with a `lineItems` issue when the total would not fit the
    /// invoice columns.
    pub fn compute(items: &[LineItem], tax_rate: Decimal) -> AppResult<Self> {
        let too_large = || {
            AppError::invalid_field(
                "lineItems",
                format!("Invoice total must be at most {}", MAX_MONEY),
            )
        };
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount()?))
            .ok_or_else(too_large)?;
        let tax_amount = subtotal
            .checked_mul(tax_rate)
            .and_then(|taxed| taxed.checked_div(Decimal::ONE_HUNDRED))
            .map(round_cents)
            .ok_or_else(too_large)?;
        let total = subtotal.checked_add(tax_amount).ok_or_else(too_large)?;
        if total > MAX_MONEY {
            return Err(too_large());
        }
        Ok(Self {
            subtotal,
            tax_amount,
            total,
        })
    }
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Human-facing invoice number, unique per owner
pub fn invoice_number(issue_date: NaiveDate, sequence: i64) -> String {
    format!("INV-{}-{:04}", issue_date.year(), sequence)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub number: String,
    pub line_items: Value,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Invoice {
    pub fn status_enum(&self) -> InvoiceStatus {
        InvoiceStatus::from_str(&self.status).unwrap_or(InvoiceStatus::Draft)
    }

    /// Stored status, except that a sent invoice past its due date reads as overdue
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match (self.status_enum(), self.due_date) {
            (InvoiceStatus::Sent, Some(due)) if due < today => InvoiceStatus::Overdue,
            (status, _) => status,
        }
    }

    /// Apply `effective_status` to the serialized status field
    pub fn with_effective_status(mut self, today: NaiveDate) -> Self {
        self.status = self.effective_status(today).as_str().to_string();
        self
    }
}

/// `?search=&clientId=&page=&limit=` on CRM listings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmQuery {
    pub search: Option<String>,
    pub client_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl CrmQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Search term, ignoring blank input
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Body of `POST /api/crm/clients`; also used for `PATCH` with every field optional
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

impl Validate for CreateClient {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("name", &self.name, 200)
            .email("email", self.email.as_deref())
            .max_len("phone", self.phone.as_deref(), 50)
            .max_len("company", self.company.as_deref(), 200)
            .max_len("notes", self.notes.as_deref(), 5000);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

impl Validate for UpdateClient {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("name", self.name.as_deref(), 200)
            .email("email", self.email.as_deref())
            .max_len("phone", self.phone.as_deref(), 50)
            .max_len("company", self.company.as_deref(), 200)
            .max_len("notes", self.notes.as_deref(), 5000);
        v.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposal {
    pub client_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub total_amount: Decimal,
    pub currency: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

impl Validate for CreateProposal {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("title", &self.title, 200)
            .max_len("content", Some(self.content.as_str()), 20_000)
            .non_negative("totalAmount", Some(self.total_amount))
            .money("totalAmount", Some(self.total_amount))
            .currency("currency", self.currency.as_deref());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProposal {
    pub trip_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub total_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

impl Validate for UpdateProposal {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("title", self.title.as_deref(), 200)
            .max_len("content", self.content.as_deref(), 20_000)
            .non_negative("totalAmount", self.total_amount)
            .money("totalAmount", self.total_amount)
            .currency("currency", self.currency.as_deref());
        v.finish()
    }
}

/// Body of `POST /api/crm/proposals/{id}/respond`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RespondToProposal {
    pub accepted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub client_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub tax_rate: Decimal,
    pub currency: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for CreateInvoice {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.check(
            !self.line_items.is_empty(),
            "lineItems",
            "At least one line item is required",
        )
        .currency("currency", self.currency.as_deref())
        .max_len("notes", self.notes.as_deref(), 5000);
        check_tax_rate(&mut v, self.tax_rate);
        check_line_items(&mut v, &self.line_items);
        if let (Some(issue), Some(due)) = (self.issue_date, self.due_date) {
            v.check(due >= issue, "dueDate", "Due date must be on or after issue date");
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoice {
    pub line_items: Option<Vec<LineItem>>,
    pub tax_rate: Option<Decimal>,
    pub currency: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Validate for UpdateInvoice {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.currency("currency", self.currency.as_deref())
            .max_len("notes", self.notes.as_deref(), 5000);
        if let Some(rate) = self.tax_rate {
            check_tax_rate(&mut v, rate);
        }
        if let Some(items) = &self.line_items {
            v.check(!items.is_empty(), "lineItems", "At least one line item is required");
            check_line_items(&mut v, items);
        }
        v.finish()
    }
}

fn check_tax_rate(v: &mut Validator, rate: Decimal) {
    v.check(
        rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED,
        "taxRate",
        "Must be between 0 and 100",
    );
}

fn check_line_items(v: &mut Validator, items: &[LineItem]) {
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("lineItems[{}]", i);
        v.required(&format!("{}.description", prefix), &item.description, 500)
            .check(
                item.quantity > Decimal::ZERO,
                &format!("{}.quantity", prefix),
                "Must be greater than 0",
            )
            .within_money_range(&format!("{}.quantity", prefix), Some(item.quantity))
            .non_negative(&format!("{}.unitPrice", prefix), Some(item.unit_price))
            .money(&format!("{}.unitPrice", prefix), Some(item.unit_price));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(qty: i64, price_cents: i64) -> LineItem {
        LineItem {
            description: "Night".into(),
            quantity: Decimal::new(qty, 0),
            unit_price: Decimal::new(price_cents, 2),
        }
    }

    #[test]
    fn totals_round_each_step() {
        let items = vec![item(3, 12_999), item(1, 4_550)];
        let totals = InvoiceTotals::compute(&items, Decimal::new(825, 2)).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(43_547, 2));
        // 435.47 * 8.25% = 35.926... -> 35.93
        assert_eq!(totals.tax_amount, Decimal::new(3_593, 2));
        assert_eq!(totals.total, Decimal::new(47_140, 2));
    }

    #[test]
    fn empty_invoice_totals_zero() {
        let totals = InvoiceTotals::compute(&[], Decimal::new(20, 0)).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    fn invoice_with(items: Vec<LineItem>) -> CreateInvoice {
        CreateInvoice {
            client_id: Uuid::new_v4(),
            trip_id: None,
            line_items: items,
            tax_rate: Decimal::new(10, 0),
            currency: Some("USD".into()),
            issue_date: None,
            due_date: None,
            notes: None,
        }
    }

    #[test]
    fn huge_quantity_fails_validation_instead_of_overflowing() {
        let huge = LineItem {
            description: "Suite".into(),
            quantity: Decimal::MAX,
            unit_price: Decimal::new(1_000, 2),
        };
        let input = invoice_with(vec![huge.clone()]);
        match input.validate() {
            Err(AppError::Validation(issues)) => {
                assert!(issues.iter().any(|i| i.field == "lineItems[0].quantity"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(InvoiceTotals::compute(&input.line_items, input.tax_rate).is_err());
        assert_eq!(huge.amount(), None);
    }

    #[test]
    fn totals_past_column_range_are_a_field_issue() {
        // each item is in range on its own, the product is not
        let item = LineItem {
            description: "Charter".into(),
            quantity: MAX_MONEY,
            unit_price: MAX_MONEY,
        };
        let input = invoice_with(vec![item.clone(), item]);
        assert!(input.validate().is_ok());
        match InvoiceTotals::compute(&input.line_items, input.tax_rate) {
            Err(AppError::Validation(issues)) => assert_eq!(issues[0].field, "lineItems"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn proposal_amount_is_bounded() {
        let proposal = CreateProposal {
            client_id: Uuid::new_v4(),
            trip_id: None,
            title: "Lisbon retreat".into(),
            content: String::new(),
            total_amount: Decimal::new(10_000_000_000, 0),
            currency: None,
            valid_until: None,
        };
        assert!(proposal.validate().is_err());
        let patch = UpdateProposal {
            total_amount: Some(MAX_MONEY),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn invoice_numbers_are_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(invoice_number(date, 7), "INV-2025-0007");
    }

    #[test]
    fn sent_invoice_past_due_is_overdue() {
        let now = chrono::Utc::now().naive_utc();
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let invoice = Invoice {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            trip_id: None,
            number: "INV-2025-0001".into(),
            line_items: serde_json::json!([]),
            subtotal: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            currency: "USD".into(),
            status: "SENT".into(),
            issue_date: today,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 31),
            notes: None,
            sent_at: Some(now),
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(invoice.effective_status(today), InvoiceStatus::Overdue);

        let paid = Invoice {
            status: "PAID".into(),
            ..invoice
        };
        assert_eq!(paid.effective_status(today), InvoiceStatus::Paid);
    }

    #[test]
    fn invoice_body_reports_line_item_fields() {
        let body = CreateInvoice {
            client_id: Uuid::new_v4(),
            trip_id: None,
            line_items: vec![LineItem {
                description: "".into(),
                quantity: Decimal::ZERO,
                unit_price: Decimal::new(-1, 0),
            }],
            tax_rate: Decimal::new(150, 0),
            currency: None,
            issue_date: None,
            due_date: None,
            notes: None,
        };
        match body.validate() {
            Err(AppError::Validation(issues)) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert!(fields.contains(&"taxRate"));
                assert!(fields.contains(&"lineItems[0].description"));
                assert!(fields.contains(&"lineItems[0].quantity"));
                assert!(fields.contains(&"lineItems[0].unitPrice"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
