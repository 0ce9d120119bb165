//! Posts handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::identity::Session;
use crate::application::posts::CreatePostCommand;
use crate::application::views::admin::{AdminView, ImageUploadDraft};
use crate::application::views::post_detail::PostDetailView;
use crate::application::views::posts::PostsView;

use super::{auth_to_api, post_to_api, view_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::{ApiState, ListingDefaults};

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = ListingDefaults::resolve(query.per_page, state.listing.posts_per_page);
    let mut view = PostsView::new(state.services.clone(), per_page);
    view.load().await.map_err(view_to_api)?;

    view.set_search(query.search);
    view.set_category(query.category.filter(|id| !id.trim().is_empty()));
    view.set_sort(
        query.sort.unwrap_or_default(),
        query.order.unwrap_or_default(),
    );
    view.set_membership_filter(&session, query.filter)
        .map_err(view_to_api)?;
    view.set_page(query.page.unwrap_or(1));
    view.load_visible_comments().await.map_err(view_to_api)?;

    Ok(Json(view.page(&session)))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = session.require_principal().map_err(auth_to_api)?;
    let image = payload.image.map(ImagePayload::decode).transpose()?;

    let command = CreatePostCommand {
        title: payload.title,
        description: payload.description,
        content: payload.content,
        category_id: payload.category_id,
        image,
    };

    let post = state
        .services
        .posts
        .create_post(principal, command)
        .await
        .map_err(post_to_api)?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let per_page = ListingDefaults::resolve(query.per_page, state.listing.comments_per_page);
    let mut view = PostDetailView::new(state.services.clone(), id, per_page);
    view.load().await.map_err(view_to_api)?;
    view.set_comment_page(query.page.unwrap_or(1));

    let detail = view.detail(&session).map_err(view_to_api)?;
    Ok(Json(detail))
}

/// Apply a partial edit through the admin edit workflow.
pub async fn update_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    let image = payload.image.map(ImagePayload::decode).transpose()?;

    let mut view = AdminView::new(state.services.clone(), state.listing.admin_posts_per_page);
    view.load_post(&session, &id).await.map_err(view_to_api)?;

    let draft = view.begin_edit(&id).map_err(view_to_api)?;
    if let Some(title) = payload.title {
        draft.title = title;
    }
    if let Some(description) = payload.description {
        draft.description = description;
    }
    if let Some(content) = payload.content {
        draft.content = content;
    }
    if let Some(category_id) = payload.category_id {
        draft.category_id = Some(category_id).filter(|value| !value.trim().is_empty());
    }
    if let Some(image) = image {
        draft.image = Some(ImageUploadDraft {
            file_name: image.file_name,
            data: image.data.to_vec(),
        });
    }

    let updated = view.save_edit(&session).await.map_err(view_to_api)?;
    Ok(Json(updated))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_admin().map_err(auth_to_api)?;
    state
        .services
        .posts
        .delete_post(&id)
        .await
        .map_err(post_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
