pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::{ApiState, ListingDefaults};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::middleware::log_responses;

pub fn build_api_router(state: ApiState) -> Router {
    let session_state = state.clone();

    Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/me", get(handlers::me))
        .route(
            "/api/v1/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route(
            "/api/v1/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/v1/posts/{id}/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route(
            "/api/v1/posts/{id}/comments/{comment_id}",
            axum::routing::delete(handlers::delete_comment),
        )
        .route("/api/v1/posts/{id}/like", post(handlers::toggle_like))
        .route(
            "/api/v1/posts/{id}/favorite",
            post(handlers::toggle_favorite),
        )
        .route(
            "/api/v1/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            get(handlers::get_category)
                .patch(handlers::rename_category)
                .delete(handlers::delete_category),
        )
        .route("/api/v1/admin/overview", get(handlers::admin_overview))
        .route("/api/v1/admin/users", get(handlers::list_users))
        .route("/media/{*path}", get(handlers::serve_media))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            session_state,
            middleware::resolve_session,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
