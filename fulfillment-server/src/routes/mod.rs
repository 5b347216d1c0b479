//! HTTP routes
//!
//! Thin handlers over the services: deserialize, call, wrap in
//! [`ApiResponse`]. Domain errors convert to [`AppError`] and map to HTTP
//! status codes by error-code range.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

pub mod health;
pub mod orders;
pub mod shipments;
pub mod vouchers;

/// All routes, no middleware or state
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(shipments::router())
        .merge(vouchers::router())
}

/// Fully configured application
pub fn build_app(state: &AppState) -> Router {
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
