use async_trait::async_trait;
use serde_json::Value;

use crate::{
    application::repos::{CategoriesRepo, CategoriesWriteRepo, RepoError},
    domain::entities::CategoryRecord,
    infra::store::Fields,
};

use super::{CATEGORIES, DocumentRepositories, codec};

fn decode_category(id: String, fields: &Fields) -> CategoryRecord {
    CategoryRecord {
        id,
        name: codec::string_or_empty(fields, "name"),
    }
}

fn name_fields(name: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), Value::String(name.to_string()));
    fields
}

#[async_trait]
impl CategoriesRepo for DocumentRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let documents = self.store().list(CATEGORIES).await?;
        Ok(documents
            .into_iter()
            .map(|(id, fields)| decode_category(id, &fields))
            .collect())
    }

    async fn find_category(&self, id: &str) -> Result<Option<CategoryRecord>, RepoError> {
        let fields = self.store().get(CATEGORIES, id).await?;
        Ok(fields.map(|fields| decode_category(id.to_string(), &fields)))
    }
}

#[async_trait]
impl CategoriesWriteRepo for DocumentRepositories {
    async fn create_category(&self, name: &str) -> Result<CategoryRecord, RepoError> {
        let id = self.store().add(CATEGORIES, name_fields(name)).await?;
        Ok(CategoryRecord {
            id,
            name: name.to_string(),
        })
    }

    async fn rename_category(&self, id: &str, name: &str) -> Result<CategoryRecord, RepoError> {
        if self.store().get(CATEGORIES, id).await?.is_none() {
            return Err(RepoError::NotFound);
        }
        self.store().merge(CATEGORIES, id, name_fields(name)).await?;
        Ok(CategoryRecord {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_category(&self, id: &str) -> Result<(), RepoError> {
        self.store().delete(CATEGORIES, id).await?;
        Ok(())
    }
}
