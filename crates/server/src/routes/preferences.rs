use axum::extract::State;
use axum::Json;
use tally_core::Preferences;

use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    UserId(user): UserId,
) -> Result<Json<Preferences>, ApiError> {
    Ok(Json(state.store.get_preferences(&user).await?))
}

pub async fn put(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiJson(body): ApiJson<Preferences>,
) -> Result<Json<Preferences>, ApiError> {
    let prefs = Preferences { user_id: user, ..body }.validate()?;
    state.store.save_preferences(&prefs).await?;
    Ok(Json(prefs))
}
