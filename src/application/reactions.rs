//! Like and favorite toggles over the per-user membership sets.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::identity::Principal;
use crate::application::metrics::{record_mutation, record_store_failure};
use crate::application::repos::{PostsRepo, RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserProfileRecord;
use crate::domain::membership::MembershipSet;
use crate::domain::types::MembershipKind;

#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("post not found")]
    PostNotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result of a persisted toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub kind: MembershipKind,
    pub post_id: String,
    pub active: bool,
    pub set: MembershipSet,
}

impl ToggleOutcome {
    /// Apply the persisted set to a cached profile.
    pub fn apply_to(&self, profile: &mut UserProfileRecord) {
        match self.kind {
            MembershipKind::Liked => profile.liked_posts = self.set.clone(),
            MembershipKind::Favorites => profile.favorite_posts = self.set.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ReactionService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
}

impl ReactionService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        writer: Arc<dyn UsersWriteRepo>,
    ) -> Self {
        Self {
            posts,
            users,
            writer,
        }
    }

    /// Read the profile, toggle `post_id` in the chosen set and persist the
    /// whole set. Adding requires the post to exist; removing does not.
    /// Concurrent toggles by the same user are last-write-wins.
    pub async fn toggle(
        &self,
        principal: &Principal,
        post_id: &str,
        kind: MembershipKind,
    ) -> Result<ToggleOutcome, ReactionError> {
        let profile = self.users.find_user(&principal.id).await?;
        let current = match (&profile, kind) {
            (Some(profile), MembershipKind::Liked) => profile.liked_posts.clone(),
            (Some(profile), MembershipKind::Favorites) => profile.favorite_posts.clone(),
            (None, _) => MembershipSet::new(),
        };

        // Removing a stale id is allowed after the post itself is gone.
        if !current.contains(post_id) && self.posts.find_post(post_id).await?.is_none() {
            return Err(ReactionError::PostNotFound);
        }

        let (set, active) = current.toggled(post_id);
        self.writer
            .store_membership(&principal.id, kind, &set)
            .await
            .inspect_err(|err| {
                record_store_failure("reaction.toggle");
                warn!(
                    target = "blogboard::reactions",
                    post_id,
                    user_id = %principal.id,
                    field = kind.field(),
                    error = %err,
                    "membership write failed"
                );
            })?;

        record_mutation("reaction.toggle");
        info!(
            target = "blogboard::reactions",
            post_id,
            user_id = %principal.id,
            field = kind.field(),
            active,
            "membership toggled"
        );
        Ok(ToggleOutcome {
            kind,
            post_id: post_id.to_string(),
            active,
            set,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::CreateProfileParams;
    use crate::domain::entities::PostRecord;
    use crate::domain::types::UserRole;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Stub {
        profile: Mutex<Option<UserProfileRecord>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl PostsRepo for Stub {
        async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_post(&self, id: &str) -> Result<Option<PostRecord>, RepoError> {
            Ok((id != "gone").then(|| PostRecord {
                id: id.to_string(),
                title: String::new(),
                description: String::new(),
                content: String::new(),
                image_url: None,
                category_id: None,
                user_id: None,
                created_at: None,
            }))
        }
    }

    #[async_trait]
    impl UsersRepo for Stub {
        async fn list_users(&self) -> Result<Vec<UserProfileRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_user(&self, _: &str) -> Result<Option<UserProfileRecord>, RepoError> {
            Ok(self.profile.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl UsersWriteRepo for Stub {
        async fn create_profile(
            &self,
            _: CreateProfileParams,
        ) -> Result<UserProfileRecord, RepoError> {
            unimplemented!("not used by reaction tests")
        }

        async fn set_role(&self, _: &str, _: UserRole) -> Result<(), RepoError> {
            unimplemented!("not used by reaction tests")
        }

        async fn store_membership(
            &self,
            user_id: &str,
            kind: MembershipKind,
            set: &MembershipSet,
        ) -> Result<(), RepoError> {
            if self.fail_writes {
                return Err(RepoError::from_persistence("permission denied"));
            }
            let mut guard = self.profile.lock().unwrap();
            let profile = guard.get_or_insert_with(|| UserProfileRecord::empty(user_id));
            match kind {
                MembershipKind::Liked => profile.liked_posts = set.clone(),
                MembershipKind::Favorites => profile.favorite_posts = set.clone(),
            }
            Ok(())
        }
    }

    fn principal() -> Principal {
        Principal {
            id: "uid-1".into(),
            email: "ada@example.com".into(),
        }
    }

    #[tokio::test]
    async fn double_toggle_restores_stored_set() {
        let stub = Arc::new(Stub::default());
        *stub.profile.lock().unwrap() = Some(UserProfileRecord {
            liked_posts: MembershipSet::from_iter(["p0"]),
            ..UserProfileRecord::empty("uid-1")
        });
        let service = ReactionService::new(stub.clone(), stub.clone(), stub.clone());

        let first = service
            .toggle(&principal(), "p1", MembershipKind::Liked)
            .await
            .expect("like");
        assert!(first.active);
        assert!(first.set.contains("p1"));

        let second = service
            .toggle(&principal(), "p1", MembershipKind::Liked)
            .await
            .expect("unlike");
        assert!(!second.active);
        assert_eq!(second.set, MembershipSet::from_iter(["p0"]));
    }

    #[tokio::test]
    async fn missing_profile_starts_from_empty_set() {
        let stub = Arc::new(Stub::default());
        let service = ReactionService::new(stub.clone(), stub.clone(), stub.clone());

        let outcome = service
            .toggle(&principal(), "p9", MembershipKind::Favorites)
            .await
            .expect("favorite");
        assert!(outcome.active);

        let stored = stub.profile.lock().unwrap().clone().expect("profile written");
        assert!(stored.favorite_posts.contains("p9"));
        assert!(stored.liked_posts.is_empty());
    }

    #[tokio::test]
    async fn failed_write_is_reported() {
        let stub = Arc::new(Stub {
            fail_writes: true,
            ..Stub::default()
        });
        let service = ReactionService::new(stub.clone(), stub.clone(), stub);

        let err = service
            .toggle(&principal(), "p1", MembershipKind::Liked)
            .await
            .expect_err("write fails");
        assert!(matches!(err, ReactionError::Repo(_)));
    }

    #[tokio::test]
    async fn unknown_post_is_rejected() {
        let stub = Arc::new(Stub::default());
        let service = ReactionService::new(stub.clone(), stub.clone(), stub);
        assert!(matches!(
            service
                .toggle(&principal(), "gone", MembershipKind::Liked)
                .await,
            Err(ReactionError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn stale_id_of_deleted_post_can_be_removed() {
        let stub = Arc::new(Stub::default());
        *stub.profile.lock().unwrap() = Some(UserProfileRecord {
            favorite_posts: MembershipSet::from_iter(["gone", "p1"]),
            ..UserProfileRecord::empty("uid-1")
        });
        let service = ReactionService::new(stub.clone(), stub.clone(), stub.clone());

        let outcome = service
            .toggle(&principal(), "gone", MembershipKind::Favorites)
            .await
            .expect("remove stale id");
        assert!(!outcome.active);
        assert_eq!(outcome.set, MembershipSet::from_iter(["p1"]));

        assert!(matches!(
            service
                .toggle(&principal(), "gone", MembershipKind::Favorites)
                .await,
            Err(ReactionError::PostNotFound)
        ));
    }
}
