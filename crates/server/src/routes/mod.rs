mod analytics;
mod budgets;
mod categories;
mod currencies;
mod expenses;
mod preferences;
mod receipts;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tally_receipt::MAX_UPLOAD_BYTES;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart boundaries and headers around a maximum-size file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let scan = Router::new()
        .route("/api/receipts/scan", post(receipts::scan))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD));

    let api = Router::new()
        .route("/api/currencies", get(currencies::list))
        .route("/api/currencies/convert", get(currencies::convert))
        .route("/api/categories", get(categories::list).post(categories::create))
        .route("/api/categories/{id}", delete(categories::delete))
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/api/expenses/{id}",
            get(expenses::get).put(expenses::update).delete(expenses::delete),
        )
        .route("/api/budgets", get(budgets::list).put(budgets::upsert))
        .route("/api/budgets/{id}", delete(budgets::delete))
        .route("/api/preferences", get(preferences::get).put(preferences::put))
        .route("/api/analytics/summary", get(analytics::summary));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(scan)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
