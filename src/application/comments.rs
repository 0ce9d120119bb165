use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::identity::Principal;
use crate::application::metrics::{record_mutation, record_store_failure};
use crate::application::repos::{
    CommentsRepo, CommentsWriteRepo, CreateCommentParams, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::display::commenter_name;
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CommentService {
    reader: Arc<dyn CommentsRepo>,
    writer: Arc<dyn CommentsWriteRepo>,
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl CommentService {
    pub fn new(
        reader: Arc<dyn CommentsRepo>,
        writer: Arc<dyn CommentsWriteRepo>,
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            posts,
            users,
        }
    }

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, CommentError> {
        self.reader
            .list_comments(post_id)
            .await
            .map_err(CommentError::from)
    }

    /// Comments for several posts, keyed by post id. Fetched one post at a time.
    pub async fn comments_by_post(
        &self,
        post_ids: &[String],
    ) -> Result<HashMap<String, Vec<CommentRecord>>, CommentError> {
        let mut grouped = HashMap::new();
        for post_id in post_ids {
            let comments = self.reader.list_comments(post_id).await?;
            grouped.insert(post_id.clone(), comments);
        }
        Ok(grouped)
    }

    pub async fn add_comment(
        &self,
        author: &Principal,
        post_id: &str,
        text: &str,
    ) -> Result<CommentRecord, CommentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentError::ConstraintViolation("text"));
        }
        if self.posts.find_post(post_id).await?.is_none() {
            return Err(CommentError::PostNotFound);
        }

        let profile = self.users.find_user(&author.id).await?;
        let params = CreateCommentParams {
            post_id: post_id.to_string(),
            user_id: Some(author.id.clone()),
            user_name: commenter_name(profile.as_ref(), Some(&author.email)),
            text: text.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };

        let comment = self.writer.create_comment(params).await.inspect_err(|err| {
            record_store_failure("comment.create");
            warn!(target = "blogboard::comments", post_id, error = %err, "comment create failed");
        })?;

        record_mutation("comment.create");
        info!(
            target = "blogboard::comments",
            post_id,
            comment_id = %comment.id,
            user_id = %author.id,
            "comment added"
        );
        Ok(comment)
    }

    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), CommentError> {
        match self.writer.delete_comment(post_id, comment_id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(CommentError::NotFound),
            Err(err) => {
                record_store_failure("comment.delete");
                warn!(target = "blogboard::comments", post_id, comment_id, error = %err, "comment delete failed");
                return Err(err.into());
            }
        }

        record_mutation("comment.delete");
        info!(target = "blogboard::comments", post_id, comment_id, "comment deleted");
        Ok(())
    }
}
