use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::{Expense, ExpenseId, UnvalidatedExpense, ValidatedExpense};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// Inclusive date bounds; either side may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateFilter {
    pub fn check(&self) -> Result<(), ApiError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ApiError::BadRequest(format!(
                "'from' ({from}) is after 'to' ({to})"
            ))),
            _ => Ok(()),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiQuery(filter): ApiQuery<DateFilter>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    filter.check()?;
    Ok(Json(state.store.list_expenses(&user, filter.from, filter.to).await?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiJson(body): ApiJson<UnvalidatedExpense>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = ValidatedExpense::validate(body)?;
    let created = state.store.create_expense(&user, &expense).await?;
    tracing::info!(user = %user, expense = %created.id, "Expense created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Expense>, ApiError> {
    Ok(Json(state.store.get_expense(&user, ExpenseId(id)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UnvalidatedExpense>,
) -> Result<Json<Expense>, ApiError> {
    let expense = ValidatedExpense::validate(body)?;
    Ok(Json(state.store.update_expense(&user, ExpenseId(id), &expense).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_expense(&user, ExpenseId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
