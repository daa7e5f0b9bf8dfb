use axum::Router;

pub mod adjustments;
pub mod products;
pub mod reports;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/adjustments", adjustments::router())
        .nest("/reports", reports::router())
}
