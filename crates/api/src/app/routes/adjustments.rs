use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use stockledger_adjustments::{AdjustmentBuilder, StockAdjustment, serialize_for_print};
use stockledger_core::AdjustmentId;
use stockledger_infra::{AdjustmentFilter, LedgerResult};

use crate::app::services::{AppServices, Ledger};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_adjustment).get(list_adjustments))
        .route("/csv-rows", get(csv_rows))
        .route("/:id", get(get_adjustment).delete(delete_adjustment))
        .route("/:id/print", get(print_adjustment))
        .route("/:id/submit", post(submit_adjustment))
        .route("/:id/approve", post(approve_adjustment))
        .route("/:id/reject", post(reject_adjustment))
        .route("/:id/reverse", post(reverse_adjustment))
}

fn parse_id(raw: &str) -> Result<AdjustmentId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

/// Stage every line through the builder, then hand the draft to the ledger.
fn stage_and_record(ledger: &Ledger, body: dto::CreateAdjustmentRequest) -> LedgerResult<StockAdjustment> {
    let mut builder = AdjustmentBuilder::new(body.adjustment_type).allow_negative(body.allow_negative);
    builder.set_reason_label(&body.reason)?;
    for line in body.items {
        builder.add_item(ledger.catalog(), &line.sku, line.quantity, line.reason)?;
    }

    let date = body.date.unwrap_or_else(|| Utc::now().date_naive());
    let draft = builder.build(date, body.notes, &body.created_by)?;

    if body.draft {
        ledger.save_draft(draft)
    } else {
        ledger.create(draft)
    }
}

pub async fn create_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateAdjustmentRequest>,
) -> axum::response::Response {
    match stage_and_record(services.ledger(), body) {
        Ok(adj) => (StatusCode::CREATED, Json(adj)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_adjustments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdjustmentFilter>,
) -> axum::response::Response {
    match services.ledger().list(&filter) {
        Ok(items) => (StatusCode::OK, Json(dto::list_to_json(&items))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn csv_rows(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<AdjustmentFilter>,
) -> axum::response::Response {
    match services.ledger().list(&filter) {
        Ok(items) => (StatusCode::OK, Json(dto::csv_rows_to_json(&items))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger().get(id) {
        Ok(adj) => (StatusCode::OK, Json(adj)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn print_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger().get(id) {
        Ok(adj) => (StatusCode::OK, Json(serialize_for_print(&adj))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger().delete_draft(id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

fn transition(
    services: &AppServices,
    id: &str,
    body: dto::ActorRequest,
    op: impl FnOnce(&Ledger, AdjustmentId, &str) -> LedgerResult<StockAdjustment>,
) -> axum::response::Response {
    let id = match parse_id(id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match op(services.ledger(), id, &body.actor) {
        Ok(adj) => (StatusCode::OK, Json(adj)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn submit_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    transition(&services, &id, body, |ledger, id, actor| ledger.submit(id, actor))
}

pub async fn approve_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    transition(&services, &id, body, |ledger, id, actor| ledger.approve(id, actor))
}

pub async fn reject_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    transition(&services, &id, body, |ledger, id, actor| ledger.reject(id, actor))
}

pub async fn reverse_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ActorRequest>,
) -> axum::response::Response {
    transition(&services, &id, body, |ledger, id, actor| ledger.reverse(id, actor))
}
