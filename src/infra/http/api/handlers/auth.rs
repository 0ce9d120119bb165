//! Account handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::identity::{RegisterCommand, Session};

use super::auth_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn register(
    State(state): State<ApiState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (auth, profile) = state
        .services
        .auth
        .register(RegisterCommand {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
        })
        .await
        .map_err(auth_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            principal: PrincipalResponse::from(&auth.principal),
            token: auth.token,
            profile,
        }),
    ))
}

pub async fn login(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (auth, profile) = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(AuthResponse {
        principal: PrincipalResponse::from(&auth.principal),
        token: auth.token,
        profile,
    }))
}

pub async fn logout(
    State(state): State<ApiState>,
    Extension(mut session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    session.require_principal().map_err(auth_to_api)?;
    state
        .services
        .auth
        .sign_out(&mut session)
        .await
        .map_err(auth_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(session): Extension<Session>) -> Result<impl IntoResponse, ApiError> {
    let principal = session.require_principal().map_err(auth_to_api)?;
    let profile = session.profile().cloned().ok_or_else(ApiError::unauthorized)?;
    Ok(Json(MeResponse {
        principal: PrincipalResponse::from(principal),
        profile,
    }))
}
