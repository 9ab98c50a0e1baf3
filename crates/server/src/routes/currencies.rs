use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::currency::{self, CurrencyInfo};

use crate::auth::UserId;
use crate::error::ApiError;
use crate::extract::ApiQuery;

pub async fn list(_user: UserId) -> Json<Vec<CurrencyInfo>> {
    Json(currency::all())
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: &'static str,
    pub to: &'static str,
    pub result: f64,
    pub formatted: String,
}

/// Unlike the library call, unknown codes are rejected here.
pub async fn convert(
    _user: UserId,
    ApiQuery(q): ApiQuery<ConvertQuery>,
) -> Result<Json<Conversion>, ApiError> {
    if !q.amount.is_finite() {
        return Err(ApiError::BadRequest("Amount must be a finite number".into()));
    }
    let from = currency::normalize_code(&q.from)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported currency: '{}'", q.from)))?;
    let to = currency::normalize_code(&q.to)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported currency: '{}'", q.to)))?;

    let result = currency::convert(q.amount, from, to);
    Ok(Json(Conversion {
        amount: q.amount,
        from,
        to,
        result,
        formatted: currency::format_amount(result, to),
    }))
}
