use std::collections::HashMap;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::application::identity::{AuthError, Session};
use crate::application::listing::{ListState, SortKey, SortOrder};
use crate::application::pagination::Page;
use crate::application::posts::CreatePostCommand;
use crate::application::services::AppServices;
use crate::domain::display::category_name;
use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord, UserProfileRecord};
use crate::domain::membership::MembershipSet;
use crate::domain::types::MembershipKind;

use super::ViewError;

/// One row of the posts listing.
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub post: PostRecord,
    pub category_name: String,
    pub liked: bool,
    pub favorited: bool,
    pub comments: Vec<CommentRecord>,
}

pub struct PostsView {
    services: AppServices,
    posts: Vec<PostRecord>,
    categories: Vec<CategoryRecord>,
    comments: HashMap<String, Vec<CommentRecord>>,
    membership: Option<MembershipKind>,
    state: ListState,
}

impl PostsView {
    pub fn new(services: AppServices, per_page: NonZeroUsize) -> Self {
        Self {
            services,
            posts: Vec::new(),
            categories: Vec::new(),
            comments: HashMap::new(),
            membership: None,
            state: ListState::new(per_page),
        }
    }

    /// Fetch posts and categories, then the comments of the visible page.
    pub async fn load(&mut self) -> Result<(), ViewError> {
        let posts = self.services.posts.list_posts().await?;
        let categories = self.services.categories.list_categories().await?;
        self.posts = posts;
        self.categories = categories;
        self.revalidate();
        self.load_visible_comments().await
    }

    pub async fn load_visible_comments(&mut self) -> Result<(), ViewError> {
        let ids: Vec<String> = self
            .state
            .run(self.posts.iter().collect::<Vec<_>>())
            .items
            .into_iter()
            .map(|post| post.id.clone())
            .collect();
        let grouped = self
            .services
            .comments
            .comments_by_post(&ids)
            .await?;
        self.comments.extend(grouped);
        Ok(())
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn categories(&self) -> &[CategoryRecord] {
        &self.categories
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.state.set_search(search);
    }

    pub fn set_category(&mut self, category_id: Option<String>) {
        self.state.set_category(category_id);
    }

    pub fn set_sort(&mut self, sort: SortKey, order: SortOrder) {
        self.state.set_sort(sort);
        self.state.set_order(order);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.state.count_matching(&self.posts);
        self.state.set_page(page, total);
    }

    /// Show only liked or favorited posts. Requires a signed-in session.
    pub fn set_membership_filter(
        &mut self,
        session: &Session,
        kind: Option<MembershipKind>,
    ) -> Result<(), ViewError> {
        let set = match kind {
            None => None,
            Some(kind) => {
                let profile = session.profile().ok_or(AuthError::Unauthenticated)?;
                Some(membership_of(profile, kind).clone())
            }
        };
        self.membership = kind;
        self.state.set_membership(set);
        Ok(())
    }

    pub fn page(&self, session: &Session) -> Page<PostCard> {
        let profile = session.profile();
        self.state
            .run(self.posts.iter().collect::<Vec<_>>())
            .map(|post| PostCard {
                category_name: category_name(&self.categories, post.category_id.as_deref())
                    .to_string(),
                liked: profile.is_some_and(|p| p.liked_posts.contains(&post.id)),
                favorited: profile.is_some_and(|p| p.favorite_posts.contains(&post.id)),
                comments: self.comments.get(&post.id).cloned().unwrap_or_default(),
                post: post.clone(),
            })
    }

    pub async fn create_post(
        &mut self,
        session: &Session,
        command: CreatePostCommand,
    ) -> Result<PostRecord, ViewError> {
        let principal = session.require_principal()?;
        let post = self.services.posts.create_post(principal, command).await?;
        self.posts.push(post.clone());
        self.revalidate();
        Ok(post)
    }

    pub async fn add_comment(
        &mut self,
        session: &Session,
        post_id: &str,
        text: &str,
    ) -> Result<CommentRecord, ViewError> {
        let principal = session.require_principal()?;
        let comment = self
            .services
            .comments
            .add_comment(principal, post_id, text)
            .await?;
        self.comments
            .entry(post_id.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    /// Toggle like or favorite, then patch the session profile and the
    /// active membership filter.
    pub async fn toggle(
        &mut self,
        session: &mut Session,
        post_id: &str,
        kind: MembershipKind,
    ) -> Result<bool, ViewError> {
        let principal = session.require_principal()?.clone();
        let outcome = self
            .services
            .reactions
            .toggle(&principal, post_id, kind)
            .await?;

        if let Some(mut profile) = session.profile().cloned() {
            outcome.apply_to(&mut profile);
            session.update_profile(profile);
        }
        if self.membership == Some(kind) {
            self.state.refresh_membership(outcome.set.clone());
            self.revalidate();
        }
        Ok(outcome.active)
    }

    fn revalidate(&mut self) {
        let total = self.state.count_matching(&self.posts);
        self.state.revalidate(total);
    }
}

fn membership_of(profile: &UserProfileRecord, kind: MembershipKind) -> &MembershipSet {
    match kind {
        MembershipKind::Liked => &profile.liked_posts,
        MembershipKind::Favorites => &profile.favorite_posts,
    }
}
