//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: ledger wiring (catalog, adjustment records, event bus)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockledger_infra::LedgerConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: LedgerConfig) -> Router {
    build_app_with(Arc::new(services::AppServices::new(config)))
}

/// Build the router over existing services (tests seed the catalog first).
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
