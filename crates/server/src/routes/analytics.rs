use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tally_core::analytics::{self, BudgetStatus, CategoryTotal, MonthTotal};
use tally_core::Money;

use super::expenses::DateFilter;
use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Every amount below is in this currency.
    pub currency: String,
    pub total: Money,
    pub expense_count: usize,
    pub by_category: Vec<CategoryTotal>,
    pub monthly: Vec<MonthTotal>,
    pub budgets: Vec<BudgetStatus>,
}

/// Totals for the filtered range; budget progress always covers the
/// current period regardless of the filter.
pub async fn summary(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiQuery(filter): ApiQuery<DateFilter>,
) -> Result<Json<Summary>, ApiError> {
    filter.check()?;
    let store = &state.store;
    let prefs = store.get_preferences(&user).await?;
    let currency = prefs.currency;

    let categories = store.list_categories(&user).await?;
    let budgets = store.list_budgets(&user).await?;
    let all = store.list_expenses(&user, None, None).await?;

    let in_range: Vec<_> = all
        .iter()
        .filter(|e| filter.from.map_or(true, |from| e.date >= from))
        .filter(|e| filter.to.map_or(true, |to| e.date <= to))
        .cloned()
        .collect();

    let total: Money = in_range.iter().map(|e| e.amount_in(&currency)).sum();
    let today = Utc::now().date_naive();

    Ok(Json(Summary {
        total,
        expense_count: in_range.len(),
        by_category: analytics::spending_by_category(&in_range, &categories, &currency),
        monthly: analytics::monthly_totals(&in_range, &currency),
        budgets: analytics::budget_progress(&budgets, &all, &currency, today),
        currency,
    }))
}
