//! Repository implementations over a [`DocumentStore`].

mod categories;
mod codec;
mod comments;
mod posts;
mod users;

use std::sync::Arc;

use crate::infra::store::DocumentStore;

pub(crate) const POSTS: &str = "posts";
pub(crate) const CATEGORIES: &str = "categories";
pub(crate) const USERS: &str = "users";

pub(crate) fn comments_collection(post_id: &str) -> String {
    format!("{POSTS}/{post_id}/comments")
}

#[derive(Clone)]
pub struct DocumentRepositories {
    store: Arc<dyn DocumentStore>,
}

impl DocumentRepositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
