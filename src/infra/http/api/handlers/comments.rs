//! Comments handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::identity::Session;
use crate::application::views::post_detail::PostDetailView;

use super::{auth_to_api, comment_to_api, view_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::{ApiState, ListingDefaults};

pub async fn list_comments(
    State(state): State<ApiState>,
    Path(post_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = ListingDefaults::resolve(query.per_page, state.listing.comments_per_page);
    let mut view = PostDetailView::new(state.services.clone(), post_id, per_page);
    view.load().await.map_err(view_to_api)?;
    view.set_comment_page(query.page.unwrap_or(1));

    let detail = view.detail(&Session::anonymous()).map_err(view_to_api)?;
    Ok(Json(detail.comments))
}

pub async fn add_comment(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = session.require_principal().map_err(auth_to_api)?;
    let comment = state
        .services
        .comments
        .add_comment(principal, &post_id, &payload.text)
        .await
        .map_err(comment_to_api)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    state
        .services
        .comments
        .delete_comment(&post_id, &comment_id)
        .await
        .map_err(comment_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
