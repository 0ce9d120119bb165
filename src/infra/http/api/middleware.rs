use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::identity::{AuthSession, Session};
use crate::infra::http::middleware::RequestActor;

use super::handlers::auth_to_api;
use super::state::ApiState;

/// Resolve the bearer token, if any, into a [`Session`] request extension.
///
/// Requests without a token proceed anonymously; handlers decide whether a
/// principal or the admin role is required. A token that does not verify is
/// rejected outright.
pub async fn resolve_session(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(header::AUTHORIZATION)) {
        Some(token) => token,
        None => {
            request.extensions_mut().insert(Session::anonymous());
            return next.run(request).await;
        }
    };

    let principal = match state.services.auth.resolve(&token).await {
        Ok(principal) => principal,
        Err(err) => return auth_to_api(err).into_response(),
    };
    let profile = match state.services.auth.profile(&principal).await {
        Ok(profile) => profile,
        Err(err) => return auth_to_api(err).into_response(),
    };

    let actor = RequestActor {
        user_id: principal.id.clone(),
    };
    request
        .extensions_mut()
        .insert(Session::signed_in(AuthSession { principal, token }, profile));

    let mut response = next.run(request).await;
    response.extensions_mut().insert(actor);
    response
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    if bearer.is_empty() {
        return None;
    }
    Some(bearer.to_string())
}
