//! API handlers organized by resource type.
//!
//! Each submodule contains handlers for a specific resource (posts, categories, etc.).
//! Helper functions for error conversion are defined here and shared across modules.

mod admin;
mod auth;
mod categories;
mod comments;
mod media;
mod posts;
mod reactions;

pub use admin::*;
pub use auth::*;
pub use categories::*;
pub use comments::*;
pub use media::*;
pub use posts::*;
pub use reactions::*;

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::categories::CategoryError;
use crate::application::comments::CommentError;
use crate::application::identity::{AuthError, IdentityError};
use crate::application::media::MediaError;
use crate::application::posts::PostError;
use crate::application::reactions::ReactionError;
use crate::application::repos::RepoError;
use crate::application::views::ViewError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Decode { message } => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Stored document could not be processed",
            Some(message),
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORE_UNAVAILABLE,
            "Document store unavailable",
            Some(msg),
        ),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid account details", field)
        }
        AuthError::Unauthenticated => ApiError::unauthorized(),
        AuthError::Forbidden => ApiError::forbidden(),
        AuthError::Identity(IdentityError::InvalidCredentials) => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::INVALID_CREDENTIALS,
            "Invalid email or password",
            None,
        ),
        AuthError::Identity(IdentityError::InvalidToken) => ApiError::unauthorized(),
        AuthError::Identity(IdentityError::EmailTaken) => ApiError::new(
            StatusCode::CONFLICT,
            codes::EMAIL_TAKEN,
            "Email is already registered",
            None,
        ),
        AuthError::Identity(IdentityError::Backend(message)) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::IDENTITY,
            "Identity provider failure",
            Some(message),
        ),
        AuthError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn media_to_api(err: MediaError) -> ApiError {
    match err {
        MediaError::InvalidPath => ApiError::not_found("image not found"),
        MediaError::EmptyPayload => ApiError::invalid_input("Invalid image", "image"),
        MediaError::TooLarge { size, limit } => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Image exceeds the size limit",
            Some(format!("{size} > {limit} bytes")),
        ),
        MediaError::Backend(message) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::MEDIA,
            "Object store failure",
            Some(message),
        ),
    }
}

pub(crate) fn post_to_api(err: PostError) -> ApiError {
    match err {
        PostError::ConstraintViolation(field) => ApiError::invalid_input("Invalid post", field),
        PostError::NotFound => ApiError::not_found("post not found"),
        PostError::Media(media) => media_to_api(media),
        PostError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn category_to_api(err: CategoryError) -> ApiError {
    match err {
        CategoryError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid category", field)
        }
        CategoryError::Duplicate { name } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Category already exists",
            Some(name),
        ),
        CategoryError::NotFound => ApiError::not_found("category not found"),
        CategoryError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn comment_to_api(err: CommentError) -> ApiError {
    match err {
        CommentError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid comment", field)
        }
        CommentError::PostNotFound => ApiError::not_found("post not found"),
        CommentError::NotFound => ApiError::not_found("comment not found"),
        CommentError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn reaction_to_api(err: ReactionError) -> ApiError {
    match err {
        ReactionError::PostNotFound => ApiError::not_found("post not found"),
        ReactionError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn view_to_api(err: ViewError) -> ApiError {
    match err {
        ViewError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(entity.to_string()),
        ),
        ViewError::NotEditing => ApiError::new(
            StatusCode::CONFLICT,
            codes::NOT_EDITING,
            "No edit in progress",
            None,
        ),
        ViewError::Auth(auth) => auth_to_api(auth),
        ViewError::Post(post) => post_to_api(post),
        ViewError::Category(category) => category_to_api(category),
        ViewError::Comment(comment) => comment_to_api(comment),
        ViewError::Reaction(reaction) => reaction_to_api(reaction),
        ViewError::Repo(repo) => repo_to_api(repo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(
            repo_to_api(RepoError::from_persistence("offline")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            auth_to_api(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            post_to_api(PostError::Media(MediaError::TooLarge { size: 2, limit: 1 })).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            view_to_api(ViewError::NotFound { entity: "post" }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            category_to_api(CategoryError::Duplicate { name: "News".into() }).code(),
            codes::DUPLICATE
        );
    }
}
