use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::identity::Principal;
use crate::application::media::{ImageStore, ImageUpload, MediaError};
use crate::application::metrics::{record_mutation, record_store_failure};
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    images: Arc<dyn ImageStore>,
    max_image_bytes: usize,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        images: Arc<dyn ImageStore>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            reader,
            writer,
            images,
            max_image_bytes,
        }
    }

    pub async fn list_posts(&self) -> Result<Vec<PostRecord>, PostError> {
        self.reader.list_posts().await.map_err(PostError::from)
    }

    pub async fn find_post(&self, id: &str) -> Result<Option<PostRecord>, PostError> {
        self.reader.find_post(id).await.map_err(PostError::from)
    }

    pub async fn require_post(&self, id: &str) -> Result<PostRecord, PostError> {
        self.find_post(id).await?.ok_or(PostError::NotFound)
    }

    pub async fn create_post(
        &self,
        author: &Principal,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostError> {
        let CreatePostCommand {
            title,
            description,
            content,
            category_id,
            image,
        } = command;

        let title = required(title, "title")?;
        let description = required(description, "description")?;
        let content = required(content, "content")?;
        let category_id = normalize_category(category_id);
        self.check_image(image.as_ref())?;

        let image_url = self.store_image(image).await?;
        let params = CreatePostParams {
            title,
            description,
            content,
            image_url,
            category_id,
            user_id: Some(author.id.clone()),
            created_at: OffsetDateTime::now_utc(),
        };

        let post = self.writer.create_post(params).await.inspect_err(|err| {
            record_store_failure("post.create");
            warn!(target = "blogboard::posts", error = %err, "post create failed");
        })?;

        record_mutation("post.create");
        info!(
            target = "blogboard::posts",
            post_id = %post.id,
            user_id = %author.id,
            "post created"
        );
        Ok(post)
    }

    /// Replace title, description, content and category. A new image replaces
    /// the stored URL; creation date and owner are kept.
    pub async fn update_post(&self, command: UpdatePostCommand) -> Result<PostRecord, PostError> {
        let UpdatePostCommand {
            id,
            title,
            description,
            content,
            category_id,
            image,
        } = command;

        let title = required(title, "title")?;
        let description = required(description, "description")?;
        let content = required(content, "content")?;
        let category_id = normalize_category(category_id);
        self.check_image(image.as_ref())?;

        let existing = self.require_post(&id).await?;
        let image_url = match self.store_image(image).await? {
            Some(url) => Some(url),
            None => existing.image_url,
        };

        let params = UpdatePostParams {
            id,
            title,
            description,
            content,
            category_id,
            image_url,
        };

        let post = self.writer.update_post(params).await.inspect_err(|err| {
            record_store_failure("post.update");
            warn!(target = "blogboard::posts", error = %err, "post update failed");
        })?;

        record_mutation("post.update");
        info!(target = "blogboard::posts", post_id = %post.id, "post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), PostError> {
        match self.writer.delete_post(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(PostError::NotFound),
            Err(err) => {
                record_store_failure("post.delete");
                warn!(target = "blogboard::posts", post_id = id, error = %err, "post delete failed");
                return Err(err.into());
            }
        }

        record_mutation("post.delete");
        info!(target = "blogboard::posts", post_id = id, "post deleted");
        Ok(())
    }

    fn check_image(&self, image: Option<&ImageUpload>) -> Result<(), PostError> {
        let Some(image) = image else {
            return Ok(());
        };
        if image.data.is_empty() {
            return Err(PostError::ConstraintViolation("image"));
        }
        if image.data.len() > self.max_image_bytes {
            return Err(PostError::Media(MediaError::TooLarge {
                size: image.data.len(),
                limit: self.max_image_bytes,
            }));
        }
        Ok(())
    }

    async fn store_image(&self, image: Option<ImageUpload>) -> Result<Option<String>, PostError> {
        let Some(image) = image else {
            return Ok(None);
        };
        let stored = self
            .images
            .store(&image.file_name, image.data)
            .await
            .inspect_err(|err| {
                record_store_failure("image.store");
                warn!(target = "blogboard::posts", error = %err, "image upload failed");
            })?;
        Ok(Some(self.images.public_url(&stored)))
    }
}

fn required(value: String, field: &'static str) -> Result<String, PostError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PostError::ConstraintViolation(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn normalize_category(category_id: Option<String>) -> Option<String> {
    category_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::media::StoredImage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubPosts {
        existing: Mutex<Option<PostRecord>>,
        created: Mutex<Vec<CreatePostParams>>,
        updated: Mutex<Vec<UpdatePostParams>>,
    }

    #[async_trait]
    impl PostsRepo for StubPosts {
        async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
            Ok(self.existing.lock().unwrap().clone().into_iter().collect())
        }

        async fn find_post(&self, _: &str) -> Result<Option<PostRecord>, RepoError> {
            Ok(self.existing.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl PostsWriteRepo for StubPosts {
        async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
            self.created.lock().unwrap().push(params.clone());
            Ok(PostRecord {
                id: "new".into(),
                title: params.title,
                description: params.description,
                content: params.content,
                image_url: params.image_url,
                category_id: params.category_id,
                user_id: params.user_id,
                created_at: Some(params.created_at),
            })
        }

        async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
            self.updated.lock().unwrap().push(params.clone());
            let existing = self.existing.lock().unwrap().clone().ok_or(RepoError::NotFound)?;
            Ok(PostRecord {
                title: params.title,
                description: params.description,
                content: params.content,
                category_id: params.category_id,
                image_url: params.image_url,
                ..existing
            })
        }

        async fn delete_post(&self, _: &str) -> Result<(), RepoError> {
            Err(RepoError::from_persistence("backend offline"))
        }

        async fn clear_category(&self, _: &str) -> Result<Vec<String>, RepoError> {
            Ok(Vec::new())
        }
    }

    struct StubImages;

    #[async_trait]
    impl ImageStore for StubImages {
        async fn store(&self, name: &str, _: Bytes) -> Result<StoredImage, MediaError> {
            Ok(StoredImage {
                path: format!("images/{name}"),
            })
        }

        fn public_url(&self, image: &StoredImage) -> String {
            format!("/media/{}", image.path)
        }

        async fn read(&self, _: &str) -> Result<Bytes, MediaError> {
            Err(MediaError::InvalidPath)
        }
    }

    fn service(posts: Arc<StubPosts>) -> PostService {
        PostService::new(posts.clone(), posts, Arc::new(StubImages), 16)
    }

    fn author() -> Principal {
        Principal {
            id: "uid-1".into(),
            email: "ada@example.com".into(),
        }
    }

    fn command(title: &str) -> CreatePostCommand {
        CreatePostCommand {
            title: title.into(),
            description: "desc".into(),
            content: "body".into(),
            category_id: Some(" ".into()),
            image: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_title_without_writing() {
        let posts = Arc::new(StubPosts::default());
        let err = service(posts.clone())
            .create_post(&author(), command("   "))
            .await
            .expect_err("blank title");

        assert!(matches!(err, PostError::ConstraintViolation("title")));
        assert!(posts.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_records_owner_image_and_clears_blank_category() {
        let posts = Arc::new(StubPosts::default());
        let mut cmd = command("Hello");
        cmd.image = Some(ImageUpload {
            file_name: "cat.png".into(),
            data: Bytes::from_static(b"png"),
        });

        let post = service(posts.clone())
            .create_post(&author(), cmd)
            .await
            .expect("create");

        assert_eq!(post.user_id.as_deref(), Some("uid-1"));
        assert_eq!(post.image_url.as_deref(), Some("/media/images/cat.png"));
        assert_eq!(post.category_id, None);
        assert!(post.created_at.is_some());
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let posts = Arc::new(StubPosts::default());
        let mut cmd = command("Hello");
        cmd.image = Some(ImageUpload {
            file_name: "big.png".into(),
            data: Bytes::from(vec![0u8; 32]),
        });

        let err = service(posts.clone())
            .create_post(&author(), cmd)
            .await
            .expect_err("too large");
        assert!(matches!(
            err,
            PostError::Media(MediaError::TooLarge { size: 32, limit: 16 })
        ));
    }

    #[tokio::test]
    async fn update_keeps_existing_image_when_none_supplied() {
        let posts = Arc::new(StubPosts::default());
        *posts.existing.lock().unwrap() = Some(PostRecord {
            id: "p1".into(),
            title: "Old".into(),
            description: "d".into(),
            content: "c".into(),
            image_url: Some("/media/images/old.png".into()),
            category_id: Some("c1".into()),
            user_id: Some("uid-1".into()),
            created_at: None,
        });

        let post = service(posts.clone())
            .update_post(UpdatePostCommand {
                id: "p1".into(),
                title: "New".into(),
                description: "d2".into(),
                content: "c2".into(),
                category_id: Some(String::new()),
                image: None,
            })
            .await
            .expect("update");

        assert_eq!(post.title, "New");
        assert_eq!(post.image_url.as_deref(), Some("/media/images/old.png"));
        assert_eq!(post.category_id, None);
        assert_eq!(post.user_id.as_deref(), Some("uid-1"));
    }

    #[tokio::test]
    async fn update_of_missing_post_is_not_found() {
        let posts = Arc::new(StubPosts::default());
        let err = service(posts.clone())
            .update_post(UpdatePostCommand {
                id: "missing".into(),
                title: "t".into(),
                description: "d".into(),
                content: "c".into(),
                category_id: None,
                image: None,
            })
            .await
            .expect_err("missing");
        assert!(matches!(err, PostError::NotFound));
        assert!(posts.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_is_surfaced() {
        let posts = Arc::new(StubPosts::default());
        let err = service(posts).delete_post("p1").await.expect_err("offline");
        assert!(matches!(err, PostError::Repo(RepoError::Persistence(_))));
    }
}
