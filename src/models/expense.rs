use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Expense categories accepted by the API
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "ACCOMMODATION",
    "TRANSPORT",
    "FOOD",
    "ACTIVITIES",
    "SHOPPING",
    "OTHER",
];

/// Expense model: money spent on a trip, optionally split between collaborators
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub date: NaiveDate,
    pub paid_by: Option<Uuid>,
    pub split_among: Vec<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

pub fn is_valid_category(category: &str) -> bool {
    EXPENSE_CATEGORIES.contains(&category)
}

/// Body of `POST /api/trips/{id}/expenses`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpense {
    pub description: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub paid_by: Option<Uuid>,
    #[serde(default)]
    pub split_among: Vec<Uuid>,
}

impl Validate for CreateExpense {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.required("description", &self.description, 500)
            .positive("amount", Some(self.amount))
            .money("amount", Some(self.amount))
            .currency("currency", self.currency.as_deref());
        if let Some(category) = &self.category {
            v.check(is_valid_category(category), "category", "Unknown category");
        }
        v.finish()
    }
}

/// Body of `PATCH /api/trips/{id}/expenses/{expenseId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpense {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub paid_by: Option<Uuid>,
    pub split_among: Option<Vec<Uuid>>,
}

impl Validate for UpdateExpense {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.optional_non_blank("description", self.description.as_deref(), 500)
            .positive("amount", self.amount)
            .money("amount", self.amount)
            .currency("currency", self.currency.as_deref());
        if let Some(category) = &self.category {
            v.check(is_valid_category(category), "category", "Unknown category");
        }
        v.finish()
    }
}

/// `?category=&page=&limit=` on the expense listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseQuery {
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(amount: Decimal, category: Option<&str>) -> CreateExpense {
        CreateExpense {
            description: "Dinner".into(),
            amount,
            currency: Some("EUR".into()),
            category: category.map(str::to_string),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            paid_by: None,
            split_among: vec![],
        }
    }

    #[test]
    fn amount_must_be_positive_cents() {
        assert!(body(Decimal::new(4250, 2), Some("FOOD")).validate().is_ok());
        assert!(body(Decimal::ZERO, None).validate().is_err());
        assert!(body(Decimal::new(1, 3), None).validate().is_err());
    }

    #[test]
    fn amount_must_fit_the_column() {
        assert!(body(Decimal::new(999_999_999_999, 2), None).validate().is_ok());
        assert!(body(Decimal::new(100_000_000_000, 0), None).validate().is_err());
        let patch = UpdateExpense {
            amount: Some(Decimal::new(10_000_000_000, 0)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn category_must_be_known() {
        assert!(body(Decimal::ONE, Some("CASINO")).validate().is_err());
    }
}
