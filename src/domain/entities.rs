//! Domain entities mirrored from the document store.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::{membership::MembershipSet, types::UserRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfileRecord {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub liked_posts: MembershipSet,
    pub favorite_posts: MembershipSet,
}

impl UserProfileRecord {
    /// Fresh profile for a principal that has no stored document yet.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            role: UserRole::Member,
            liked_posts: MembershipSet::new(),
            favorite_posts: MembershipSet::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
