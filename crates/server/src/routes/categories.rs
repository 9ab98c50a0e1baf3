use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tally_core::{Category, CategoryId, NewCategory};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.store.list_categories(&user).await?))
}

pub async fn create(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiJson(body): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = body.validate()?;
    let created = state.store.create_category(&user, &category).await?;
    tracing::info!(user = %user, category = %created.name, "Category created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_category(&user, CategoryId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
