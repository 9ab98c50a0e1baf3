use serde::{Deserialize, Serialize};

use crate::currency;
use crate::expense::{check_amount, CategoryId, ValidationError};
use crate::money::Money;
use crate::period::BudgetPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetId(pub i64);

/// A spending limit for one category, or overall when `category_id` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: String,
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub currency: String,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: Option<CategoryId>,
    pub amount: Money,
    pub currency: String,
    pub period: BudgetPeriod,
}

impl NewBudget {
    pub fn validate(self) -> Result<NewBudget, ValidationError> {
        let amount = check_amount(self.amount)?;
        let currency = currency::normalize_code(&self.currency)
            .ok_or_else(|| ValidationError::UnsupportedCurrency(self.currency.clone()))?;
        Ok(NewBudget {
            amount,
            currency: currency.to_string(),
            ..self
        })
    }
}

/// Per-user settings. Missing rows read as `Preferences::default_for`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(skip_deserializing)]
    pub user_id: String,
    pub currency: String,
    pub email_notifications: bool,
    pub budget_alerts: bool,
}

impl Preferences {
    pub fn default_for(user_id: &str) -> Self {
        Preferences {
            user_id: user_id.to_string(),
            currency: currency::BASE_CURRENCY.to_string(),
            email_notifications: true,
            budget_alerts: true,
        }
    }

    pub fn validate(self) -> Result<Preferences, ValidationError> {
        let currency = currency::normalize_code(&self.currency)
            .ok_or_else(|| ValidationError::UnsupportedCurrency(self.currency.clone()))?;
        Ok(Preferences {
            currency: currency.to_string(),
            ..self
        })
    }
}
