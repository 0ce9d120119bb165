//! Service bundle wired from one repository backend and the external collaborators.

use std::sync::Arc;

use crate::application::categories::CategoryService;
use crate::application::comments::CommentService;
use crate::application::identity::{AuthService, IdentityProvider};
use crate::application::media::ImageStore;
use crate::application::posts::PostService;
use crate::application::reactions::ReactionService;
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CommentsRepo, CommentsWriteRepo, PostsRepo,
    PostsWriteRepo, UsersRepo, UsersWriteRepo,
};
use crate::application::users::UserService;

/// Limits enforced by the services.
#[derive(Debug, Clone, Copy)]
pub struct ServiceLimits {
    pub max_image_bytes: usize,
    pub min_password_length: usize,
}

/// Every repository trait, implemented by a single backend.
pub trait Repositories:
    PostsRepo
    + PostsWriteRepo
    + CategoriesRepo
    + CategoriesWriteRepo
    + CommentsRepo
    + CommentsWriteRepo
    + UsersRepo
    + UsersWriteRepo
    + 'static
{
}

impl<T> Repositories for T where
    T: PostsRepo
        + PostsWriteRepo
        + CategoriesRepo
        + CategoriesWriteRepo
        + CommentsRepo
        + CommentsWriteRepo
        + UsersRepo
        + UsersWriteRepo
        + 'static
{
}

#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub posts: PostService,
    pub categories: CategoryService,
    pub comments: CommentService,
    pub reactions: ReactionService,
    pub users: UserService,
}

impl AppServices {
    pub fn new<R: Repositories>(
        repos: Arc<R>,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageStore>,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            auth: AuthService::new(
                identity,
                repos.clone(),
                repos.clone(),
                limits.min_password_length,
            ),
            posts: PostService::new(
                repos.clone(),
                repos.clone(),
                images,
                limits.max_image_bytes,
            ),
            categories: CategoryService::new(repos.clone(), repos.clone(), repos.clone()),
            comments: CommentService::new(
                repos.clone(),
                repos.clone(),
                repos.clone(),
                repos.clone(),
            ),
            reactions: ReactionService::new(repos.clone(), repos.clone(), repos.clone()),
            users: UserService::new(repos),
        }
    }

    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.auth = self.auth.with_admin_emails(emails);
        self
    }
}
