//! Like and favorite toggles

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;

use crate::application::identity::Session;
use crate::domain::types::MembershipKind;

use super::{auth_to_api, reaction_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ToggleResponse;
use crate::infra::http::api::state::ApiState;

pub async fn toggle_like(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(&state, &session, &post_id, MembershipKind::Liked).await
}

pub async fn toggle_favorite(
    State(state): State<ApiState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(&state, &session, &post_id, MembershipKind::Favorites).await
}

async fn toggle(
    state: &ApiState,
    session: &Session,
    post_id: &str,
    kind: MembershipKind,
) -> Result<Json<ToggleResponse>, ApiError> {
    let principal = session.require_principal().map_err(auth_to_api)?;
    let outcome = state
        .services
        .reactions
        .toggle(principal, post_id, kind)
        .await
        .map_err(reaction_to_api)?;

    Ok(Json(ToggleResponse {
        post_id: outcome.post_id,
        kind: outcome.kind,
        active: outcome.active,
    }))
}
