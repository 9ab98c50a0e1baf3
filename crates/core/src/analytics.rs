//! Spending summaries. Every figure is converted into a single display
//! currency before it is summed.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::budget::{Budget, BudgetId};
use crate::expense::{Category, CategoryId, Expense};
use crate::money::Money;
use crate::period::{BudgetPeriod, DateRange};

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub total: Money,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget_id: BudgetId,
    pub category_id: Option<CategoryId>,
    pub period: BudgetPeriod,
    pub range: DateRange,
    pub limit: Money,
    pub spent: Money,
    pub remaining: Money,
    pub percent_used: f64,
    pub over_budget: bool,
}

pub fn spending_by_category(
    expenses: &[Expense],
    categories: &[Category],
    currency: &str,
) -> Vec<CategoryTotal> {
    let names: HashMap<CategoryId, &str> =
        categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut totals: HashMap<Option<CategoryId>, (Money, usize)> = HashMap::new();
    for e in expenses {
        // An id pointing at a category we don't know about counts as uncategorized.
        let key = e.category_id.filter(|id| names.contains_key(id));
        let entry = totals.entry(key).or_insert((Money::zero(), 0));
        entry.0 = entry.0 + e.amount_in(currency);
        entry.1 += 1;
    }

    let mut out: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category_id, (total, count))| CategoryTotal {
            category_id,
            name: category_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            total,
            count,
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    out
}

pub fn monthly_totals(expenses: &[Expense], currency: &str) -> Vec<MonthTotal> {
    let mut by_month: BTreeMap<(i32, u32), Money> = BTreeMap::new();
    for e in expenses {
        let key = (e.date.year(), e.date.month());
        let slot = by_month.entry(key).or_insert_with(Money::zero);
        *slot = *slot + e.amount_in(currency);
    }
    by_month
        .into_iter()
        .map(|((y, m), total)| MonthTotal {
            month: format!("{y:04}-{m:02}"),
            total,
        })
        .collect()
}

/// Progress of each budget over the period that contains `today`.
///
/// Limits and spend are both reported in `currency`.
pub fn budget_progress(
    budgets: &[Budget],
    expenses: &[Expense],
    currency: &str,
    today: NaiveDate,
) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .map(|b| {
            let range = b.period.range_containing(today);
            let spent: Money = expenses
                .iter()
                .filter(|e| range.contains(e.date))
                .filter(|e| b.category_id.is_none() || e.category_id == b.category_id)
                .map(|e| e.amount_in(currency))
                .sum();
            let limit = b.amount.convert(&b.currency, currency);
            let percent_used = if limit.is_zero() {
                0.0
            } else {
                (spent.to_f64() / limit.to_f64() * 100.0 * 10.0).round() / 10.0
            };
            BudgetStatus {
                budget_id: b.id,
                category_id: b.category_id,
                period: b.period,
                range,
                limit,
                spent,
                remaining: limit - spent,
                percent_used,
                over_budget: spent > limit,
            }
        })
        .collect()
}
