use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockledger_catalog::{Product, ProductRepo, Sku};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/low-stock", get(low_stock))
        .route("/:sku", get(get_product).put(upsert_product))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().catalog().list() {
        Ok(items) => (StatusCode::OK, Json(dto::list_to_json(&items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn low_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().catalog().low_stock() {
        Ok(items) => (StatusCode::OK, Json(dto::list_to_json(&items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
) -> axum::response::Response {
    let sku = match Sku::parse(&sku) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.ledger().catalog().get(&sku) {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Catalog maintenance: insert or replace one row.
pub async fn upsert_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(sku): Path<String>,
    Json(body): Json<dto::UpsertProductRequest>,
) -> axum::response::Response {
    let sku = match Sku::parse(&sku) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut product = Product::new(sku, body.name, body.quantity, body.unit_cost);
    if let Some(level) = body.reorder_level {
        product = product.with_reorder_level(level);
    }

    match services.ledger().catalog().put(product) {
        Ok(stored) => {
            tracing::info!(sku = %stored.sku(), quantity = stored.quantity(), "product stored");
            (StatusCode::OK, Json(stored)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
