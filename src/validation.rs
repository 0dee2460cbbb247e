//! Field-level request validation.
//!
//! A [`Validator`] collects every problem in a request body before failing, so
//! clients receive the full `details` array in one 400 response.

use crate::error::{AppError, AppResult, FieldIssue};
use rust_decimal::Decimal;

/// Largest amount a `NUMERIC(12,2)` column holds
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Implemented by request bodies
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.issues.push(FieldIssue::new(field, message));
        self
    }

    /// Record `message` against `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    /// Non-blank string of at most `max` characters
    pub fn required(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "Required");
        } else {
            self.max_len(field, Some(value), max);
        }
        self
    }

    /// Like `required`, but only when the field was supplied
    pub fn optional_non_blank(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            self.required(field, value, max);
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(field, format!("Must be at most {} characters", max));
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            if !is_valid_email(value) {
                self.add(field, "Invalid email address");
            }
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: Option<Decimal>) -> &mut Self {
        if let Some(value) = value {
            if value <= Decimal::ZERO {
                self.add(field, "Must be greater than 0");
            }
        }
        self
    }

    pub fn non_negative(&mut self, field: &str, value: Option<Decimal>) -> &mut Self {
        if let Some(value) = value {
            if value < Decimal::ZERO {
                self.add(field, "Must not be negative");
            }
        }
        self
    }

    /// At most two decimal places and no larger than [`MAX_MONEY`]
    pub fn money(&mut self, field: &str, value: Option<Decimal>) -> &mut Self {
        if let Some(value) = value {
            if value.normalize().scale() > 2 {
                self.add(field, "Must have at most 2 decimal places");
            }
        }
        self.within_money_range(field, value)
    }

    pub fn within_money_range(&mut self, field: &str, value: Option<Decimal>) -> &mut Self {
        if let Some(value) = value {
            if value.abs() > MAX_MONEY {
                self.add(field, format!("Must be at most {}", MAX_MONEY));
            }
        }
        self
    }

    pub fn currency(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            if !is_valid_currency(value) {
                self.add(field, "Must be a 3-letter ISO currency code");
            }
        }
        self
    }

    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            if !(value.starts_with("http://") || value.starts_with("https://")) || value.len() > 2048
            {
                self.add(field, "Must be an http(s) URL");
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.issues)))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.len() > 254 || value.contains(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn is_valid_currency(value: &str) -> bool {
    value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_issue() {
        let mut v = Validator::new();
        v.required("title", "   ", 100)
            .email("email", Some("not-an-email"))
            .positive("amount", Some(Decimal::ZERO))
            .currency("currency", Some("usd"));

        match v.finish() {
            Err(AppError::Validation(issues)) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "email", "amount", "currency"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn passes_clean_input() {
        let mut v = Validator::new();
        v.required("title", "Weekend in Porto", 100)
            .email("email", Some("ana@example.com"))
            .positive("amount", Some(Decimal::new(1250, 2)))
            .money("amount", Some(Decimal::new(1250, 2)))
            .currency("currency", Some("EUR"))
            .url("url", None);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn length_counts_characters() {
        let mut v = Validator::new();
        v.max_len("name", Some("ééé"), 3);
        assert!(v.is_empty());
        v.max_len("name", Some("éééé"), 3);
        assert!(!v.is_empty());
    }

    #[test]
    fn money_rejects_fractional_cents() {
        let mut v = Validator::new();
        v.money("amount", Some(Decimal::new(10_005, 3)));
        assert!(!v.is_empty());
        let mut v = Validator::new();
        v.money("amount", Some(Decimal::new(10_000, 3)));
        assert!(v.is_empty());
    }

    #[test]
    fn money_rejects_amounts_past_column_range() {
        assert_eq!(MAX_MONEY, Decimal::new(999_999_999_999, 2));

        let mut v = Validator::new();
        v.money("amount", Some(Decimal::new(10_000_000_000, 0)));
        match v.finish() {
            Err(AppError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "amount");
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let mut v = Validator::new();
        v.money("amount", Some(MAX_MONEY))
            .within_money_range("quantity", Some(Decimal::new(-999_999_999_999, 2)));
        assert!(v.is_empty());

        let mut v = Validator::new();
        v.within_money_range("quantity", Some(Decimal::MAX));
        assert!(!v.is_empty());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@c.com"));
    }
}
