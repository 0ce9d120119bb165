//! Categories handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::identity::Session;
use crate::application::views::category::CategoryView;

use super::{auth_to_api, category_to_api, view_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::{ApiState, ListingDefaults};

pub async fn list_categories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list_categories()
        .await
        .map_err(category_to_api)?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = ListingDefaults::resolve(query.per_page, state.listing.posts_per_page);
    let mut view = CategoryView::new(state.services.clone(), id, per_page);
    view.load().await.map_err(view_to_api)?;

    view.set_search(query.search);
    view.set_sort(
        query.sort.unwrap_or_default(),
        query.order.unwrap_or_default(),
    );
    view.set_page(query.page.unwrap_or(1));

    let page = view.page().map_err(view_to_api)?;
    Ok(Json(page))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    let category = state
        .services
        .categories
        .create_category(&payload.name)
        .await
        .map_err(category_to_api)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn rename_category(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    let category = state
        .services
        .categories
        .rename_category(&id, &payload.name)
        .await
        .map_err(category_to_api)?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    let deletion = state
        .services
        .categories
        .delete_category(&id)
        .await
        .map_err(category_to_api)?;
    Ok(Json(CategoryDeletedResponse {
        category_id: deletion.category_id,
        cleared_posts: deletion.cleared_posts,
    }))
}
