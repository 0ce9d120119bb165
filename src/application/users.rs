use std::sync::Arc;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::display::profile_name;
use crate::domain::entities::UserProfileRecord;

/// Read access to user profiles for author lines and the admin user list.
#[derive(Clone)]
pub struct UserService {
    reader: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(reader: Arc<dyn UsersRepo>) -> Self {
        Self { reader }
    }

    pub async fn find_user(&self, id: &str) -> Result<Option<UserProfileRecord>, RepoError> {
        self.reader.find_user(id).await
    }

    /// All profiles ordered by their display label, ignoring case.
    pub async fn list_users(&self) -> Result<Vec<UserProfileRecord>, RepoError> {
        let mut users = self.reader.list_users().await?;
        users.sort_by_cached_key(|user| {
            profile_name(user)
                .unwrap_or_else(|| user.id.clone())
                .to_lowercase()
        });
        Ok(users)
    }
}
