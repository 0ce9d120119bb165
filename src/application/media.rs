//! Object store seam used by the post handlers to host images.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("image of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("object store failure: {0}")]
    Backend(String),
}

/// Image bytes submitted with a post.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Bytes,
}

/// Location of a stored blob inside the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store a named blob and return its location.
    async fn store(&self, name: &str, data: Bytes) -> Result<StoredImage, MediaError>;

    /// Public URL for a stored blob.
    fn public_url(&self, image: &StoredImage) -> String;

    async fn read(&self, path: &str) -> Result<Bytes, MediaError>;
}
