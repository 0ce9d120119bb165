use std::num::NonZeroUsize;

use serde::Serialize;

use crate::application::identity::Session;
use crate::application::listing::{ListQuery, ListState, SortKey, SortOrder};
use crate::application::pagination::Page;
use crate::application::services::AppServices;
use crate::domain::display::{author_name, category_name, format_timestamp};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::types::MembershipKind;

use super::ViewError;

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostRecord,
    pub category_name: String,
    pub author_name: String,
    pub created: String,
    pub liked: bool,
    pub favorited: bool,
    pub comments: Page<CommentRecord>,
}

/// One post with its comments, newest first.
pub struct PostDetailView {
    services: AppServices,
    post_id: String,
    post: Option<PostRecord>,
    category_name: String,
    author_name: String,
    comments: Vec<CommentRecord>,
    state: ListState,
}

impl PostDetailView {
    pub fn new(services: AppServices, post_id: impl Into<String>, per_page: NonZeroUsize) -> Self {
        let query = ListQuery {
            sort: SortKey::CreatedAt,
            order: SortOrder::Desc,
            ..ListQuery::default()
        };
        Self {
            services,
            post_id: post_id.into(),
            post: None,
            category_name: String::new(),
            author_name: String::new(),
            comments: Vec::new(),
            state: ListState::with_query(query, per_page),
        }
    }

    pub async fn load(&mut self) -> Result<(), ViewError> {
        let post = self
            .services
            .posts
            .find_post(&self.post_id)
            .await?
            .ok_or(ViewError::NotFound { entity: "post" })?;
        let categories = self.services.categories.list_categories().await?;
        let author = match post.user_id.as_deref() {
            Some(user_id) => self.services.users.find_user(user_id).await?,
            None => None,
        };
        let comments = self.services.comments.list_comments(&self.post_id).await?;

        self.category_name = category_name(&categories, post.category_id.as_deref()).to_string();
        self.author_name = author_name(author.as_ref());
        self.post = Some(post);
        self.comments = comments;
        self.state.revalidate(self.comments.len());
        Ok(())
    }

    pub fn set_comment_page(&mut self, page: usize) {
        self.state.set_page(page, self.comments.len());
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn detail(&self, session: &Session) -> Result<PostDetail, ViewError> {
        let post = self
            .post
            .clone()
            .ok_or(ViewError::NotFound { entity: "post" })?;
        let profile = session.profile();
        Ok(PostDetail {
            category_name: self.category_name.clone(),
            author_name: self.author_name.clone(),
            created: format_timestamp(post.created_at),
            liked: profile.is_some_and(|p| p.liked_posts.contains(&post.id)),
            favorited: profile.is_some_and(|p| p.favorite_posts.contains(&post.id)),
            comments: self.state.run(self.comments.clone()),
            post,
        })
    }

    pub async fn add_comment(
        &mut self,
        session: &Session,
        text: &str,
    ) -> Result<CommentRecord, ViewError> {
        let principal = session.require_principal()?;
        let comment = self
            .services
            .comments
            .add_comment(principal, &self.post_id, text)
            .await?;
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub async fn delete_comment(
        &mut self,
        session: &Session,
        comment_id: &str,
    ) -> Result<(), ViewError> {
        session.require_admin()?;
        self.services
            .comments
            .delete_comment(&self.post_id, comment_id)
            .await?;
        self.comments.retain(|comment| comment.id != comment_id);
        self.state.revalidate(self.comments.len());
        Ok(())
    }

    pub async fn toggle(
        &mut self,
        session: &mut Session,
        kind: MembershipKind,
    ) -> Result<bool, ViewError> {
        let principal = session.require_principal()?.clone();
        let outcome = self
            .services
            .reactions
            .toggle(&principal, &self.post_id, kind)
            .await?;
        if let Some(mut profile) = session.profile().cloned() {
            outcome.apply_to(&mut profile);
            session.update_profile(profile);
        }
        Ok(outcome.active)
    }
}
