use std::collections::HashMap;
use std::num::NonZeroUsize;

use serde::Serialize;

use crate::application::identity::Session;
use crate::application::listing::{ListQuery, ListState, SortKey, SortOrder};
use crate::application::pagination::Page;
use crate::application::services::AppServices;
use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord};

use super::ViewError;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPostCard {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: CategoryRecord,
    pub posts: Page<CategoryPostCard>,
}

/// Posts of one category through the shared pipeline.
pub struct CategoryView {
    services: AppServices,
    category_id: String,
    category: Option<CategoryRecord>,
    posts: Vec<PostRecord>,
    comments: HashMap<String, Vec<CommentRecord>>,
    state: ListState,
}

impl CategoryView {
    pub fn new(
        services: AppServices,
        category_id: impl Into<String>,
        per_page: NonZeroUsize,
    ) -> Self {
        let category_id = category_id.into();
        let query = ListQuery {
            category_id: Some(category_id.clone()),
            ..ListQuery::default()
        };
        Self {
            services,
            category_id,
            category: None,
            posts: Vec::new(),
            comments: HashMap::new(),
            state: ListState::with_query(query, per_page),
        }
    }

    pub async fn load(&mut self) -> Result<(), ViewError> {
        let category = self
            .services
            .categories
            .require_category(&self.category_id)
            .await?;
        let posts = self.services.posts.list_posts().await?;
        let visible: Vec<String> = self
            .state
            .run(posts.iter().collect::<Vec<_>>())
            .items
            .into_iter()
            .map(|post| post.id.clone())
            .collect();
        let comments = self
            .services
            .comments
            .comments_by_post(&visible)
            .await?;

        self.category = Some(category);
        self.posts = posts;
        self.comments = comments;
        self.state.revalidate(self.state.count_matching(&self.posts));
        Ok(())
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

    pub fn page(&self) -> Result<CategoryPage, ViewError> {
        let category = self
            .category
            .clone()
            .ok_or(ViewError::NotFound { entity: "category" })?;
        let posts = self
            .state
            .run(self.posts.iter().collect::<Vec<_>>())
            .map(|post| CategoryPostCard {
                comments: self.comments.get(&post.id).cloned().unwrap_or_default(),
                post: post.clone(),
            });
        Ok(CategoryPage { category, posts })
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::categories::CategoryError;
    use crate::application::posts::CreatePostCommand;
    use crate::application::views::testing::{fixture, session};
    use crate::domain::types::UserRole;

    #[tokio::test]
    async fn lists_only_posts_of_the_category() {
        let fx = fixture();
        let user = session("u1", UserRole::Member);
        let principal = user.principal().expect("principal").clone();
        let news = fx
            .services
            .categories
            .create_category("News")
            .await
            .expect("category");
        for (title, category) in [("a", Some(news.id.clone())), ("b", None), ("c", Some(news.id.clone()))] {
            fx.services
                .posts
                .create_post(
                    &principal,
                    CreatePostCommand {
                        title: title.into(),
                        description: "d".into(),
                        content: "c".into(),
                        category_id: category,
                        image: None,
                    },
                )
                .await
                .expect("post");
        }

        let mut view = CategoryView::new(
            fx.services.clone(),
            &news.id,
            NonZeroUsize::new(6).expect("non-zero"),
        );
        view.load().await.expect("load");
        view.set_sort(SortKey::Title, SortOrder::Asc);
        let page = view.page().expect("page");

        assert_eq!(page.category.name, "News");
        let titles: Vec<_> = page.posts.items.iter().map(|card| card.post.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);

        let comment = view
            .add_comment(&user, &page.posts.items[0].post.id, "first!")
            .await
            .expect("comment");
        let page = view.page().expect("page");
        assert_eq!(page.posts.items[0].comments, vec![comment]);
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let fx = fixture();
        let mut view = CategoryView::new(
            fx.services.clone(),
            "missing",
            NonZeroUsize::new(6).expect("non-zero"),
        );
        assert!(matches!(
            view.load().await,
            Err(ViewError::Category(CategoryError::NotFound))
        ));
    }
}
