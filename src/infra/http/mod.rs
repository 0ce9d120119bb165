pub mod api;
mod middleware;

pub use api::{ApiState, ListingDefaults, build_api_router};
pub use middleware::{RequestActor, RequestContext};

use axum::{
    Router, extract::DefaultBodyLimit, http::StatusCode, middleware as axum_middleware,
    routing::get,
};

/// Room for JSON framing around a base64 image.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Request body ceiling that still admits a maximum-size image as base64.
pub fn body_limit_for(max_image_bytes: usize) -> usize {
    max_image_bytes
        .saturating_add(2)
        .saturating_div(3)
        .saturating_mul(4)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Full application router: the JSON API, media delivery and liveness.
pub fn build_router(state: ApiState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(build_api_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
