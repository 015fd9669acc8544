//! HTTP route handlers.
//!
//! The service exposes a single webhook route. Every response is a fresh
//! random draw, so caches are told not to store it.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod sharkfact;

use axum::{middleware, routing::post, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Path of the chat webhook route
pub const SHARKFACT_PATH: &str = "/sharkfact";

/// Cache-Control value for fact responses
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Creates the Axum router with the fact route and its middleware.
pub fn create_router(state: AppState) -> Router {
    let fact_routes = Router::new()
        .route(SHARKFACT_PATH, post(sharkfact::sharkfact))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ));

    Router::new()
        .merge(fact_routes)
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
