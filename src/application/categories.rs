use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::metrics::{record_mutation, record_store_failure};
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::CategoryRecord;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("category `{name}` already exists")]
    Duplicate { name: String },
    #[error("category not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Outcome of a category delete: the posts whose reference was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDeletion {
    pub category_id: String,
    pub cleared_posts: Vec<String>,
}

#[derive(Clone)]
pub struct CategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    posts: Arc<dyn PostsWriteRepo>,
}

impl CategoryService {
    pub fn new(
        reader: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn CategoriesWriteRepo>,
        posts: Arc<dyn PostsWriteRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            posts,
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, CategoryError> {
        self.reader
            .list_categories()
            .await
            .map_err(CategoryError::from)
    }

    pub async fn require_category(&self, id: &str) -> Result<CategoryRecord, CategoryError> {
        self.reader
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    /// Create a category. Names are trimmed and unique ignoring case.
    pub async fn create_category(&self, name: &str) -> Result<CategoryRecord, CategoryError> {
        let name = ensure_non_empty(name, "name")?;
        let lowered = name.to_lowercase();
        let existing = self.reader.list_categories().await?;
        if existing
            .iter()
            .any(|category| category.name.trim().to_lowercase() == lowered)
        {
            return Err(CategoryError::Duplicate { name });
        }

        let category = self.writer.create_category(&name).await.inspect_err(|err| {
            record_store_failure("category.create");
            warn!(target = "blogboard::categories", error = %err, "category create failed");
        })?;

        record_mutation("category.create");
        info!(
            target = "blogboard::categories",
            category_id = %category.id,
            name = %category.name,
            "category created"
        );
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        id: &str,
        name: &str,
    ) -> Result<CategoryRecord, CategoryError> {
        let name = ensure_non_empty(name, "name")?;
        let category = match self.writer.rename_category(id, &name).await {
            Ok(category) => category,
            Err(RepoError::NotFound) => return Err(CategoryError::NotFound),
            Err(err) => {
                record_store_failure("category.rename");
                warn!(target = "blogboard::categories", category_id = id, error = %err, "category rename failed");
                return Err(err.into());
            }
        };

        record_mutation("category.rename");
        info!(target = "blogboard::categories", category_id = id, "category renamed");
        Ok(category)
    }

    /// Clear the reference on every post that uses a category, then delete
    /// it. Posts themselves are never deleted. A failed clear leaves the
    /// category in place.
    pub async fn delete_category(&self, id: &str) -> Result<CategoryDeletion, CategoryError> {
        self.require_category(id).await?;

        let cleared_posts = self.posts.clear_category(id).await.inspect_err(|err| {
            record_store_failure("category.clear_references");
            warn!(
                target = "blogboard::categories",
                category_id = id,
                error = %err,
                "post references could not be cleared; category kept"
            );
        })?;

        match self.writer.delete_category(id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(CategoryError::NotFound),
            Err(err) => {
                record_store_failure("category.delete");
                warn!(target = "blogboard::categories", category_id = id, error = %err, "category delete failed");
                return Err(err.into());
            }
        }

        record_mutation("category.delete");
        info!(
            target = "blogboard::categories",
            category_id = id,
            cleared = cleared_posts.len(),
            "category deleted"
        );
        Ok(CategoryDeletion {
            category_id: id.to_string(),
            cleared_posts,
        })
    }
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<String, CategoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CategoryError::ConstraintViolation(field))
    } else {
        Ok(trimmed.to_string())
    }
}
