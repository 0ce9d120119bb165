//! Schemaless document store seam.
//!
//! Collections are slash-separated paths. A subcollection lives under its
//! parent document, e.g. `posts/{post_id}/comments`.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::repos::RepoError;

/// Field bag of one document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document `{collection}/{id}` not found")]
    NotFound { collection: String, id: String },
    #[error("invalid collection path `{0}`")]
    InvalidPath(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => RepoError::NotFound,
            StoreError::InvalidPath(path) => RepoError::InvalidInput {
                message: format!("invalid collection path `{path}`"),
            },
            other => RepoError::from_persistence(other),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of a collection as `(id, fields)`, in insertion order.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Fields)>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError>;

    /// Insert a document under a store-assigned id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Overwrite the named fields, creating the document if absent.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Remove a document. Fails with `NotFound` when absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Remove every document of a collection. Missing collections are fine.
    async fn delete_collection(&self, collection: &str) -> Result<(), StoreError>;
}

/// Reject empty segments and an even number of segments (document paths).
pub(crate) fn validate_collection(path: &str) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|segment| segment.trim().is_empty()) || segments.len() % 2 == 0 {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}
