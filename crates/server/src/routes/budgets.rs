use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tally_core::{Budget, BudgetId, NewBudget};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Result<Json<Vec<Budget>>, ApiError> {
    Ok(Json(state.store.list_budgets(&user).await?))
}

/// One budget per (category, user); saving again replaces the limit.
pub async fn upsert(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiJson(body): ApiJson<NewBudget>,
) -> Result<Json<Budget>, ApiError> {
    let budget = body.validate()?;
    Ok(Json(state.store.upsert_budget(&user, &budget).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_budget(&user, BudgetId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
