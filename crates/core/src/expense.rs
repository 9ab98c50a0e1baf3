use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::currency;
use crate::money::Money;

pub const MAX_CATEGORY_NAME_LEN: usize = 50;
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Title is longer than {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Money),
    #[error("Amount is too large")]
    AmountTooLarge,
    #[error("Unsupported currency: '{0}'")]
    UnsupportedCurrency(String),
    #[error("Category name must not be empty")]
    EmptyCategoryName,
    #[error("Category name is longer than {MAX_CATEGORY_NAME_LEN} characters")]
    CategoryNameTooLong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

impl NewCategory {
    /// Trim the name and enforce the length rules.
    pub fn validate(self) -> Result<NewCategory, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        if name.chars().count() > MAX_CATEGORY_NAME_LEN {
            return Err(ValidationError::CategoryNameTooLong);
        }
        Ok(NewCategory {
            name,
            color: non_empty(self.color),
        })
    }
}

/// A stored expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub user_id: String,
    pub title: String,
    pub amount: Money,
    pub currency: String,
    pub date: NaiveDate,
    pub category_id: Option<CategoryId>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: String,
}

impl Expense {
    pub fn amount_in(&self, currency: &str) -> Money {
        self.amount.convert(&self.currency, currency)
    }
}

/// Expense as submitted by a client, before any checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnvalidatedExpense {
    pub title: String,
    pub amount: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub date: NaiveDate,
    pub category_id: Option<CategoryId>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
}

fn default_currency() -> String {
    currency::BASE_CURRENCY.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExpense {
    pub title: String,
    pub amount: Money,
    pub currency: &'static str,
    pub date: NaiveDate,
    pub category_id: Option<CategoryId>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
    pub validated_at: DateTime<Utc>,
}

impl ValidatedExpense {
    pub fn validate(expense: UnvalidatedExpense) -> Result<ValidatedExpense, ValidationError> {
        let title = expense.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong);
        }

        let amount = check_amount(expense.amount)?;

        let currency = currency::normalize_code(&expense.currency)
            .ok_or_else(|| ValidationError::UnsupportedCurrency(expense.currency.clone()))?;

        Ok(ValidatedExpense {
            title,
            amount,
            currency,
            date: expense.date,
            category_id: expense.category_id,
            vendor: non_empty(expense.vendor),
            description: non_empty(expense.description),
            receipt_url: non_empty(expense.receipt_url),
            validated_at: Utc::now(),
        })
    }
}

/// Round to cents, then require a positive amount that fits the cents column.
pub(crate) fn check_amount(amount: Money) -> Result<Money, ValidationError> {
    let amount = Money::from_decimal(amount.as_decimal());
    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if amount.to_cents().is_none() {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(amount)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
