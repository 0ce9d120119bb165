//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord, UserProfileRecord};
use crate::domain::membership::MembershipSet;
use crate::domain::types::{MembershipKind, UserRole};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("stored document could not be decoded: {message}")]
    Decode { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: String,
    pub user_id: Option<String>,
    pub user_name: String,
    pub text: String,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateProfileParams {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_post(&self, id: &str) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Remove the post together with its comment subcollection.
    async fn delete_post(&self, id: &str) -> Result<(), RepoError>;

    /// Clear `category_id` on every post referencing the category.
    /// Returns the ids of the posts that were updated.
    async fn clear_category(&self, category_id: &str) -> Result<Vec<String>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category(&self, id: &str) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(&self, name: &str) -> Result<CategoryRecord, RepoError>;

    async fn rename_category(&self, id: &str, name: &str) -> Result<CategoryRecord, RepoError>;

    async fn delete_category(&self, id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, RepoError>;
}

#[async_trait]
pub trait CommentsWriteRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserProfileRecord>, RepoError>;

    async fn find_user(&self, id: &str) -> Result<Option<UserProfileRecord>, RepoError>;
}

#[async_trait]
pub trait UsersWriteRepo: Send + Sync {
    async fn create_profile(
        &self,
        params: CreateProfileParams,
    ) -> Result<UserProfileRecord, RepoError>;

    async fn set_role(&self, user_id: &str, role: UserRole) -> Result<(), RepoError>;

    /// Persist the whole membership set as a single field merge.
    async fn store_membership(
        &self,
        user_id: &str,
        kind: MembershipKind,
        set: &MembershipSet,
    ) -> Result<(), RepoError>;
}
