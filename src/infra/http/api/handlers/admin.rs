//! Admin dashboard handlers

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::response::IntoResponse;

use crate::application::identity::Session;
use crate::application::views::admin::AdminView;

use super::{auth_to_api, repo_to_api, view_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ListingQuery;
use crate::infra::http::api::state::{ApiState, ListingDefaults};

pub async fn admin_overview(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = ListingDefaults::resolve(query.per_page, state.listing.admin_posts_per_page);
    let mut view = AdminView::new(state.services.clone(), per_page);
    view.load(&session).await.map_err(view_to_api)?;

    view.set_search(query.search);
    view.set_sort(
        query.sort.unwrap_or_default(),
        query.order.unwrap_or_default(),
    );
    view.set_page(query.page.unwrap_or(1));

    Ok(Json(view.overview()))
}

pub async fn list_users(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    let users = state
        .services
        .users
        .list_users()
        .await
        .map_err(repo_to_api)?;
    Ok(Json(users))
}
