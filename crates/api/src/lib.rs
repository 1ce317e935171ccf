//! HTTP API layer for foodify.
//!
//! This crate exposes the officer panel as JSON endpoints:
//!
//! - **Endpoints**: donations, requests, residents, reports, content,
//!   dashboard, profile and the moderation log
//! - **Extractors**: session and officer guards, client metadata
//! - **Middleware**: session resolution from bearer token or cookie
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use endpoints::router;
pub use middleware::AppState;

/// The full application: `/api` routes behind session resolution, tracing
/// and CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
