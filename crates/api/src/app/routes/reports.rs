use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockledger_infra::AdjustmentFilter;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/adjustments/summary", get(adjustment_summary))
}

pub async fn adjustment_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdjustmentFilter>,
) -> axum::response::Response {
    match services.ledger().summary(&filter) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
