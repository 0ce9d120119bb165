use async_trait::async_trait;
use serde_json::Value;

use crate::{
    application::repos::{CommentsRepo, CommentsWriteRepo, CreateCommentParams, RepoError},
    domain::entities::CommentRecord,
    infra::store::Fields,
};

use super::{DocumentRepositories, codec, comments_collection};

fn decode_comment(post_id: &str, id: String, fields: &Fields) -> CommentRecord {
    CommentRecord {
        id,
        post_id: post_id.to_string(),
        user_id: codec::opt_string(fields, "userId"),
        user_name: codec::opt_string(fields, "userName"),
        text: codec::string_or_empty(fields, "text"),
        timestamp: codec::timestamp(fields, "timestamp"),
    }
}

#[async_trait]
impl CommentsRepo for DocumentRepositories {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, RepoError> {
        let documents = self.store().list(&comments_collection(post_id)).await?;
        Ok(documents
            .into_iter()
            .map(|(id, fields)| decode_comment(post_id, id, &fields))
            .collect())
    }
}

#[async_trait]
impl CommentsWriteRepo for DocumentRepositories {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut fields = Fields::new();
        fields.insert("text".into(), Value::String(params.text));
        fields.insert("userName".into(), Value::String(params.user_name));
        fields.insert("userId".into(), codec::opt_value(params.user_id));
        fields.insert("postId".into(), Value::String(params.post_id.clone()));
        fields.insert(
            "timestamp".into(),
            codec::encode_timestamp(params.timestamp)?,
        );

        let id = self
            .store()
            .add(&comments_collection(&params.post_id), fields.clone())
            .await?;
        Ok(decode_comment(&params.post_id, id, &fields))
    }

    async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<(), RepoError> {
        self.store()
            .delete(&comments_collection(post_id), comment_id)
            .await?;
        Ok(())
    }
}
