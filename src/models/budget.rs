use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::error::AppResult;
use crate::validation::{Validate, Validator};

/// Budget model: one per trip, with optional per-category limits
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub total: Decimal,
    pub currency: String,
    pub categories: Value, // JSONB object of category -> amount
    pub updated_at: NaiveDateTime,
}

impl Budget {
    /// Category limits; entries that are not valid amounts are skipped
    pub fn category_limits(&self) -> BTreeMap<String, Decimal> {
        parse_category_limits(&self.categories)
    }
}

pub fn parse_category_limits(value: &Value) -> BTreeMap<String, Decimal> {
    let mut limits = BTreeMap::new();
    if let Value::Object(map) = value {
        for (name, amount) in map {
            let parsed = match amount {
                Value::String(s) => s.parse::<Decimal>().ok(),
                Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
                _ => None,
            };
            if let Some(amount) = parsed {
                limits.insert(name.clone(), amount);
            }
        }
    }
    limits
}

/// Body of `PUT /api/trips/{id}/budget`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBudget {
    pub total: Decimal,
    pub currency: Option<String>,
    #[serde(default)]
    pub categories: BTreeMap<String, Decimal>,
}

impl Validate for UpsertBudget {
    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        v.non_negative("total", Some(self.total))
            .money("total", Some(self.total))
            .currency("currency", self.currency.as_deref());
        for (name, amount) in &self.categories {
            let field = format!("categories.{}", name);
            v.non_negative(&field, Some(*amount)).money(&field, Some(*amount));
        }
        let allocated = self
            .categories
            .values()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount));
        v.check(
            allocated.is_some_and(|allocated| allocated <= self.total),
            "categories",
            "Category limits exceed the total budget",
        );
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_accept_strings_and_numbers() {
        let value = serde_json::json!({"FOOD": "250.50", "TRANSPORT": 100, "bogus": true});
        let limits = parse_category_limits(&value);
        assert_eq!(limits.len(), 2);
        assert_eq!(limits["FOOD"], Decimal::new(25050, 2));
        assert_eq!(limits["TRANSPORT"], Decimal::new(100, 0));
    }

    fn budget(total: Decimal, categories: &[(&str, Decimal)]) -> UpsertBudget {
        UpsertBudget {
            total,
            currency: Some("EUR".into()),
            categories: categories
                .iter()
                .map(|(name, amount)| (name.to_string(), *amount))
                .collect(),
        }
    }

    fn issue_fields(input: &UpsertBudget) -> Vec<String> {
        match input.validate() {
            Err(crate::error::AppError::Validation(issues)) => {
                issues.into_iter().map(|i| i.field).collect()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn category_limits_must_fit_the_total() {
        let ok = budget(
            Decimal::new(1_000, 0),
            &[("FOOD", Decimal::new(400, 0)), ("LODGING", Decimal::new(600, 0))],
        );
        assert!(ok.validate().is_ok());

        let over = budget(
            Decimal::new(1_000, 0),
            &[("FOOD", Decimal::new(400, 0)), ("LODGING", Decimal::new(601, 0))],
        );
        assert_eq!(issue_fields(&over), vec!["categories"]);
    }

    #[test]
    fn huge_category_limits_are_rejected_without_overflow() {
        let input = budget(
            Decimal::new(1_000, 0),
            &[("a", Decimal::MAX), ("b", Decimal::MAX)],
        );
        let fields = issue_fields(&input);
        assert!(fields.contains(&"categories.a".to_string()));
        assert!(fields.contains(&"categories.b".to_string()));
        assert!(fields.contains(&"categories".to_string()));
    }

    #[test]
    fn total_is_bounded_by_the_column_range() {
        let input = budget(Decimal::new(10_000_000_000, 0), &[]);
        assert_eq!(issue_fields(&input), vec!["total"]);
    }
}
