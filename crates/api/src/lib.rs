//! HTTP API layer for commentable.
//!
//! - **Endpoints**: REST resources under `/api`, plus `/health`
//! - **Extractors**: the authenticated user and the calling actor
//! - **Middleware**: application state and bearer token resolution
//!
//! Built on Axum 0.8. Transport layers (tracing, CORS, timeouts) are added by
//! the server binary.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub use endpoints::router;
pub use middleware::AppState;

/// The full application: API routes, health check and authentication.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .route("/health", get(endpoints::health))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
