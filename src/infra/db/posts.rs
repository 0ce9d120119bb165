use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::{
    application::repos::{
        CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
    },
    domain::entities::PostRecord,
    infra::store::Fields,
};

use super::{DocumentRepositories, POSTS, codec, comments_collection};

fn decode_post(id: String, fields: &Fields) -> PostRecord {
    PostRecord {
        id,
        title: codec::string_or_empty(fields, "title"),
        description: codec::string_or_empty(fields, "description"),
        content: codec::string_or_empty(fields, "content"),
        image_url: codec::opt_string(fields, "imageUrl"),
        category_id: codec::opt_string(fields, "categoryId"),
        user_id: codec::opt_string(fields, "userId"),
        created_at: codec::timestamp(fields, "createdAt"),
    }
}

fn editable_fields(
    title: String,
    description: String,
    content: String,
    category_id: Option<String>,
    image_url: Option<String>,
) -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".into(), Value::String(title));
    fields.insert("description".into(), Value::String(description));
    fields.insert("content".into(), Value::String(content));
    fields.insert("categoryId".into(), codec::opt_value(category_id));
    fields.insert("imageUrl".into(), codec::opt_value(image_url));
    fields
}

#[async_trait]
impl PostsRepo for DocumentRepositories {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let documents = self.store().list(POSTS).await?;
        Ok(documents
            .into_iter()
            .map(|(id, fields)| decode_post(id, &fields))
            .collect())
    }

    async fn find_post(&self, id: &str) -> Result<Option<PostRecord>, RepoError> {
        let fields = self.store().get(POSTS, id).await?;
        Ok(fields.map(|fields| decode_post(id.to_string(), &fields)))
    }
}

#[async_trait]
impl PostsWriteRepo for DocumentRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut fields = editable_fields(
            params.title,
            params.description,
            params.content,
            params.category_id,
            params.image_url,
        );
        fields.insert("userId".into(), codec::opt_value(params.user_id));
        fields.insert(
            "createdAt".into(),
            codec::encode_timestamp(params.created_at)?,
        );

        let id = self.store().add(POSTS, fields.clone()).await?;
        Ok(decode_post(id, &fields))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        if self.store().get(POSTS, &params.id).await?.is_none() {
            return Err(RepoError::NotFound);
        }
        let fields = editable_fields(
            params.title,
            params.description,
            params.content,
            params.category_id,
            params.image_url,
        );
        self.store().merge(POSTS, &params.id, fields).await?;

        let stored = self
            .store()
            .get(POSTS, &params.id)
            .await?
            .ok_or(RepoError::NotFound)?;
        Ok(decode_post(params.id, &stored))
    }

    async fn delete_post(&self, id: &str) -> Result<(), RepoError> {
        if self.store().get(POSTS, id).await?.is_none() {
            return Err(RepoError::NotFound);
        }
        self.store().delete(POSTS, id).await?;
        // The post is gone at this point; leftover comments are unreachable.
        if let Err(err) = self.store().delete_collection(&comments_collection(id)).await {
            warn!(target = "blogboard::posts", post_id = id, error = %err, "orphaned comments left behind");
        }
        Ok(())
    }

    async fn clear_category(&self, category_id: &str) -> Result<Vec<String>, RepoError> {
        let documents = self.store().list(POSTS).await?;
        let mut cleared = Vec::new();
        for (id, fields) in documents {
            if codec::opt_string(&fields, "categoryId").as_deref() != Some(category_id) {
                continue;
            }
            let mut patch = Fields::new();
            patch.insert("categoryId".into(), Value::Null);
            self.store().merge(POSTS, &id, patch).await?;
            cleared.push(id);
        }
        Ok(cleared)
    }
}
