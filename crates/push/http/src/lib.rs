//! Push HTTP Layer
//!
//! Axum handlers that admit JSON push requests into a dispatch service.

mod handlers;

pub use handlers::*;

use std::sync::Arc;

use axum::Router;
use push_engine::{Dispatch, Service};

/// Create a router accepting requests for one provider at `path`.
pub fn push_router<D>(path: &str, service: Arc<Service<D>>) -> Router
where
    D: Dispatch,
{
    use axum::routing::post;

    Router::new()
        .route(path, post(handlers::queue_handler::<D>))
        .with_state(service)
}

/// Create the health check router.
pub fn health_router() -> Router {
    use axum::routing::get;

    Router::new().route("/health", get(handlers::health_handler))
}
