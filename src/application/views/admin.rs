use std::collections::HashMap;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::application::identity::Session;
use crate::application::listing::{ListState, SortKey, SortOrder};
use crate::application::media::ImageUpload;
use crate::application::pagination::Page;
use crate::application::posts::UpdatePostCommand;
use crate::application::services::AppServices;
use crate::domain::display::{author_name, category_name};
use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord, UserProfileRecord};

use super::ViewError;

/// Editable copy of a post's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEditDraft {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<String>,
    pub image: Option<ImageUploadDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUploadDraft {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl PostEditDraft {
    fn from_post(post: &PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            description: post.description.clone(),
            content: post.content.clone(),
            category_id: post.category_id.clone(),
            image: None,
        }
    }
}

/// Per-post editing workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Viewing,
    Editing {
        post_id: String,
        draft: PostEditDraft,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPostRow {
    pub post: PostRecord,
    pub category_name: String,
    pub author_name: String,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub posts: Page<AdminPostRow>,
    pub users: Vec<UserProfileRecord>,
    pub categories: Vec<CategoryRecord>,
    pub comment_count: usize,
}

pub struct AdminView {
    services: AppServices,
    posts: Vec<PostRecord>,
    categories: Vec<CategoryRecord>,
    users: Vec<UserProfileRecord>,
    comments: HashMap<String, Vec<CommentRecord>>,
    state: ListState,
    edit: EditState,
}

impl AdminView {
    pub fn new(services: AppServices, per_page: NonZeroUsize) -> Self {
        Self {
            services,
            posts: Vec::new(),
            categories: Vec::new(),
            users: Vec::new(),
            comments: HashMap::new(),
            state: ListState::new(per_page),
            edit: EditState::Viewing,
        }
    }

    pub async fn load(&mut self, session: &Session) -> Result<(), ViewError> {
        session.require_admin()?;
        let posts = self.services.posts.list_posts().await?;
        let categories = self.services.categories.list_categories().await?;
        let users = self.services.users.list_users().await?;
        let ids: Vec<String> = posts.iter().map(|post| post.id.clone()).collect();
        let comments = self.services.comments.comments_by_post(&ids).await?;

        self.posts = posts;
        self.categories = categories;
        self.users = users;
        self.comments = comments;
        self.revalidate();
        Ok(())
    }

    /// Load a single post for editing, leaving the rest of the view as it is.
    pub async fn load_post(&mut self, session: &Session, post_id: &str) -> Result<(), ViewError> {
        session.require_admin()?;
        let post = self
            .services
            .posts
            .find_post(post_id)
            .await?
            .ok_or(ViewError::NotFound { entity: "post" })?;

        match self.posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(slot) => *slot = post,
            None => self.posts.push(post),
        }
        self.revalidate();
        Ok(())
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn categories(&self) -> &[CategoryRecord] {
        &self.categories
    }

    pub fn users(&self) -> &[UserProfileRecord] {
        &self.users
    }

    pub fn comments_for(&self, post_id: &str) -> &[CommentRecord] {
        self.comments.get(post_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.state.set_search(search);
    }

    pub fn set_sort(&mut self, sort: SortKey, order: SortOrder) {
        self.state.set_sort(sort);
        self.state.set_order(order);
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.state.count_matching(&self.posts);
        self.state.set_page(page, total);
    }

    pub fn page(&self) -> Page<AdminPostRow> {
        self.state
            .run(self.posts.iter().collect::<Vec<_>>())
            .map(|post| {
                let owner = post
                    .user_id
                    .as_deref()
                    .and_then(|id| self.users.iter().find(|user| user.id == id));
                AdminPostRow {
                    category_name: category_name(&self.categories, post.category_id.as_deref())
                        .to_string(),
                    author_name: author_name(owner),
                    comments: self.comments_for(&post.id).to_vec(),
                    post: post.clone(),
                }
            })
    }

    pub fn overview(&self) -> AdminOverview {
        AdminOverview {
            posts: self.page(),
            users: self.users.clone(),
            categories: self.categories.clone(),
            comment_count: self.comments.values().map(Vec::len).sum(),
        }
    }

    /// `Viewing -> Editing`. Starting a new edit discards any open draft.
    pub fn begin_edit(&mut self, post_id: &str) -> Result<&mut PostEditDraft, ViewError> {
        let post = self
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .ok_or(ViewError::NotFound { entity: "post" })?;
        self.edit = EditState::Editing {
            post_id: post.id.clone(),
            draft: PostEditDraft::from_post(post),
        };
        self.draft_mut().ok_or(ViewError::NotEditing)
    }

    pub fn draft_mut(&mut self) -> Option<&mut PostEditDraft> {
        match &mut self.edit {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing => None,
        }
    }

    /// `Editing -> Viewing` without writing anything.
    pub fn cancel_edit(&mut self) {
        self.edit = EditState::Viewing;
    }

    /// `Editing -> Viewing` once the store confirms the update. A failed save
    /// stays in `Editing` with the draft intact.
    pub async fn save_edit(&mut self, session: &Session) -> Result<PostRecord, ViewError> {
        session.require_admin()?;
        let (post_id, draft) = match &self.edit {
            EditState::Editing { post_id, draft } => (post_id.clone(), draft.clone()),
            EditState::Viewing => return Err(ViewError::NotEditing),
        };

        let command = UpdatePostCommand {
            id: post_id.clone(),
            title: draft.title,
            description: draft.description,
            content: draft.content,
            category_id: draft.category_id,
            image: draft.image.map(|image| ImageUpload {
                file_name: image.file_name,
                data: image.data.into(),
            }),
        };
        let updated = self.services.posts.update_post(command).await?;

        if let Some(slot) = self.posts.iter_mut().find(|post| post.id == post_id) {
            *slot = updated.clone();
        }
        self.edit = EditState::Viewing;
        self.revalidate();
        Ok(updated)
    }

    /// Delete a post and drop its comments from the view.
    pub async fn delete_post(&mut self, session: &Session, post_id: &str) -> Result<(), ViewError> {
        session.require_admin()?;
        self.services.posts.delete_post(post_id).await?;

        self.posts.retain(|post| post.id != post_id);
        self.comments.remove(post_id);
        if matches!(&self.edit, EditState::Editing { post_id: editing, .. } if editing == post_id) {
            self.edit = EditState::Viewing;
        }
        self.revalidate();
        Ok(())
    }

    pub async fn delete_comment(
        &mut self,
        session: &Session,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), ViewError> {
        session.require_admin()?;
        self.services
            .comments
            .delete_comment(post_id, comment_id)
            .await?;
        if let Some(comments) = self.comments.get_mut(post_id) {
            comments.retain(|comment| comment.id != comment_id);
        }
        Ok(())
    }

    pub async fn create_category(
        &mut self,
        session: &Session,
        name: &str,
    ) -> Result<CategoryRecord, ViewError> {
        session.require_admin()?;
        let category = self.services.categories.create_category(name).await?;
        self.categories.push(category.clone());
        Ok(category)
    }

    pub async fn rename_category(
        &mut self,
        session: &Session,
        category_id: &str,
        name: &str,
    ) -> Result<CategoryRecord, ViewError> {
        session.require_admin()?;
        let renamed = self
            .services
            .categories
            .rename_category(category_id, name)
            .await?;
        if let Some(slot) = self
            .categories
            .iter_mut()
            .find(|category| category.id == category_id)
        {
            *slot = renamed.clone();
        }
        Ok(renamed)
    }

    /// Delete a category. Every post referencing it, in the store and in this
    /// view, ends up with no category; no post is removed.
    pub async fn delete_category(
        &mut self,
        session: &Session,
        category_id: &str,
    ) -> Result<(), ViewError> {
        session.require_admin()?;
        self.services
            .categories
            .delete_category(category_id)
            .await?;

        self.categories.retain(|category| category.id != category_id);
        for post in &mut self.posts {
            if post.category_id.as_deref() == Some(category_id) {
                post.category_id = None;
            }
        }
        if let EditState::Editing { draft, .. } = &mut self.edit
            && draft.category_id.as_deref() == Some(category_id)
        {
            draft.category_id = None;
        }
        Ok(())
    }

    fn revalidate(&mut self) {
        let total = self.state.count_matching(&self.posts);
        self.state.revalidate(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::AuthError;
    use crate::application::posts::CreatePostCommand;
    use crate::application::views::testing::{Fixture, fixture, session};
    use crate::domain::types::UserRole;

    fn per_page(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).expect("non-zero")
    }

    async fn post(fx: &Fixture, title: &str, category_id: Option<&str>) -> PostRecord {
        let author = session("author", UserRole::Member);
        fx.services
            .posts
            .create_post(
                author.principal().expect("principal"),
                CreatePostCommand {
                    title: title.into(),
                    description: "d".into(),
                    content: "c".into(),
                    category_id: category_id.map(str::to_string),
                    image: None,
                },
            )
            .await
            .expect("post")
    }

    #[tokio::test]
    async fn members_are_rejected() {
        let fx = fixture();
        let mut view = AdminView::new(fx.services.clone(), per_page(6));
        let member = session("u1", UserRole::Member);
        assert!(matches!(
            view.load(&member).await,
            Err(ViewError::Auth(AuthError::Forbidden))
        ));
        assert!(matches!(
            view.load(&Session::anonymous()).await,
            Err(ViewError::Auth(AuthError::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn deleting_category_clears_both_references_and_keeps_posts() {
        let fx = fixture();
        let admin = session("root", UserRole::Admin);
        let mut view = AdminView::new(fx.services.clone(), per_page(6));
        let category = view
            .create_category(&admin, "News")
            .await
            .expect("category");
        post(&fx, "one", Some(&category.id)).await;
        post(&fx, "two", Some(&category.id)).await;
        post(&fx, "three", None).await;
        view.load(&admin).await.expect("load");

        view.delete_category(&admin, &category.id)
            .await
            .expect("delete");

        assert_eq!(view.posts().len(), 3);
        assert!(view.posts().iter().all(|post| post.category_id.is_none()));
        assert!(view.categories().is_empty());

        let stored = fx.services.posts.list_posts().await.expect("list");
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|post| post.category_id.is_none()));
    }

    #[tokio::test]
    async fn edit_state_machine() {
        let fx = fixture();
        let admin = session("root", UserRole::Admin);
        let original = post(&fx, "Draft title", None).await;
        let mut view = AdminView::new(fx.services.clone(), per_page(6));
        view.load(&admin).await.expect("load");

        assert!(matches!(
            view.save_edit(&admin).await,
            Err(ViewError::NotEditing)
        ));

        view.begin_edit(&original.id).expect("begin").title = "Edited".into();
        view.cancel_edit();
        assert_eq!(*view.edit_state(), EditState::Viewing);
        assert_eq!(view.posts()[0].title, "Draft title");

        view.begin_edit(&original.id).expect("begin").title = "Edited".into();
        fx.store.set_offline(true);
        view.save_edit(&admin).await.expect_err("offline");
        assert!(matches!(view.edit_state(), EditState::Editing { .. }));
        assert_eq!(view.posts()[0].title, "Draft title");

        fx.store.set_offline(false);
        let saved = view.save_edit(&admin).await.expect("save");
        assert_eq!(saved.title, "Edited");
        assert_eq!(saved.created_at, original.created_at);
        assert_eq!(*view.edit_state(), EditState::Viewing);
        assert_eq!(view.posts()[0].title, "Edited");
    }

    #[tokio::test]
    async fn delete_post_drops_comments_and_clamps_page() {
        let fx = fixture();
        let admin = session("root", UserRole::Admin);
        let user = session("u1", UserRole::Member);
        let mut ids = Vec::new();
        for n in 0..3 {
            ids.push(post(&fx, &format!("post {n}"), None).await.id);
        }
        fx.services
            .comments
            .add_comment(user.principal().expect("principal"), &ids[0], "hi")
            .await
            .expect("comment");

        let mut view = AdminView::new(fx.services.clone(), per_page(2));
        view.load(&admin).await.expect("load");
        assert_eq!(view.overview().comment_count, 1);
        view.set_page(2);
        assert_eq!(view.state().page(), 2);

        fx.store.set_offline(true);
        view.delete_post(&admin, &ids[0]).await.expect_err("offline");
        assert_eq!(view.posts().len(), 3);

        fx.store.set_offline(false);
        view.delete_post(&admin, &ids[0]).await.expect("delete");
        assert_eq!(view.posts().len(), 2);
        assert!(view.comments_for(&ids[0]).is_empty());
        assert_eq!(view.state().page(), 1);
        assert_eq!(view.overview().comment_count, 0);
        assert!(
            fx.services
                .comments
                .list_comments(&ids[0])
                .await
                .expect("list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn rename_patches_the_category_list() {
        let fx = fixture();
        let admin = session("root", UserRole::Admin);
        let mut view = AdminView::new(fx.services.clone(), per_page(6));
        let category = view.create_category(&admin, "Nws").await.expect("create");
        view.rename_category(&admin, &category.id, "News")
            .await
            .expect("rename");
        assert_eq!(view.categories()[0].name, "News");

        assert!(matches!(
            view.create_category(&admin, "news").await,
            Err(ViewError::Category(_))
        ));
        assert_eq!(view.categories().len(), 1);
    }

    #[tokio::test]
    async fn single_post_load_supports_editing() {
        let fx = fixture();
        let admin = session("root", UserRole::Admin);
        let target = post(&fx, "Target", None).await;
        post(&fx, "Bystander", None).await;

        let mut view = AdminView::new(fx.services.clone(), per_page(6));
        assert!(matches!(
            view.load_post(&admin, "missing").await,
            Err(ViewError::NotFound { entity: "post" })
        ));
        assert!(matches!(
            view.load_post(&session("u1", UserRole::Member), &target.id)
                .await,
            Err(ViewError::Auth(AuthError::Forbidden))
        ));

        view.load_post(&admin, &target.id).await.expect("load post");
        assert_eq!(view.posts().len(), 1);

        view.begin_edit(&target.id).expect("begin").content = "Rewritten".into();
        let saved = view.save_edit(&admin).await.expect("save");
        assert_eq!(saved.content, "Rewritten");
        assert_eq!(saved.title, "Target");
        assert_eq!(*view.edit_state(), EditState::Viewing);
    }
}
