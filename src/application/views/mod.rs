//! Stateful list views backing the posts, post detail, category and admin pages.
//!
//! A view owns an in-memory copy of the collections it shows. Loads are
//! `async fn(&mut self, ..)`: the future borrows the view, so an in-flight
//! fetch can never outlive the view or write into it after it is gone, and
//! dropping the future cancels the fetch.
//!
//! Mutations are two-phase. The remote write is awaited first; the in-memory
//! collection is patched only after it succeeds. On failure the error is
//! returned and local state is left exactly as it was.

pub mod admin;
pub mod category;
pub mod post_detail;
pub mod posts;

use thiserror::Error;

use crate::application::categories::CategoryError;
use crate::application::comments::CommentError;
use crate::application::identity::AuthError;
use crate::application::posts::PostError;
use crate::application::reactions::ReactionError;
use crate::application::repos::RepoError;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("no post is being edited")]
    NotEditing,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Reaction(#[from] ReactionError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}
