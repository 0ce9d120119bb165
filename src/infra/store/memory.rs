//! In-process document store with optional JSON snapshot persistence.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::info;
use uuid::Uuid;

use super::{DocumentStore, Fields, StoreError, validate_collection};

type Collection = Vec<(String, Fields)>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: BTreeMap<String, Vec<SnapshotDocument>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    id: String,
    fields: Fields,
}

/// Documents kept in memory behind a `RwLock`. Each call is atomic on its
/// own; there are no multi-document transactions.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`MemoryDocumentStore::save_snapshot`].
    /// A missing file yields an empty store.
    pub async fn load_snapshot(path: &Path) -> Result<Self, StoreError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    target = "blogboard::store",
                    path = %path.display(),
                    "no snapshot found, starting empty"
                );
                return Ok(Self::new());
            }
            Err(err) => return Err(StoreError::Snapshot(err.to_string())),
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&raw).map_err(|err| StoreError::Snapshot(err.to_string()))?;
        let collections = snapshot
            .collections
            .into_iter()
            .map(|(name, documents)| {
                let documents = documents
                    .into_iter()
                    .map(|document| (document.id, document.fields))
                    .collect();
                (name, documents)
            })
            .collect::<BTreeMap<_, _>>();

        info!(
            target = "blogboard::store",
            path = %path.display(),
            collections = collections.len(),
            "snapshot loaded"
        );
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }

    /// Write every collection to `path` as JSON, replacing the file atomically.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = {
            let guard = self.collections.read().await;
            Snapshot {
                collections: guard
                    .iter()
                    .filter(|(_, documents)| !documents.is_empty())
                    .map(|(name, documents)| {
                        let documents = documents
                            .iter()
                            .map(|(id, fields)| SnapshotDocument {
                                id: id.clone(),
                                fields: fields.clone(),
                            })
                            .collect();
                        (name.clone(), documents)
                    })
                    .collect(),
            }
        };

        let encoded = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        }
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded)
            .await
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;
        fs::rename(&staging, path)
            .await
            .map_err(|err| StoreError::Snapshot(err.to_string()))?;

        info!(target = "blogboard::store", path = %path.display(), "snapshot saved");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<(String, Fields)>, StoreError> {
        validate_collection(collection)?;
        let guard = self.collections.read().await;
        Ok(guard.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        validate_collection(collection)?;
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|(existing, _)| existing == id)
                .map(|(_, fields)| fields.clone())
        }))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        validate_collection(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), fields));
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let mut guard = self.collections.write().await;
        let documents = guard.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, slot)) => *slot = fields,
            None => documents.push((id.to_string(), fields)),
        }
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let mut guard = self.collections.write().await;
        let documents = guard.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, slot)) => slot.extend(fields),
            None => documents.push((id.to_string(), fields)),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let mut guard = self.collections.write().await;
        let documents = guard.get_mut(collection);
        let position = documents
            .as_ref()
            .and_then(|documents| documents.iter().position(|(existing, _)| existing == id));
        match (documents, position) {
            (Some(documents), Some(index)) => {
                documents.remove(index);
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), StoreError> {
        validate_collection(collection)?;
        let mut guard = self.collections.write().await;
        guard.remove(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn add_list_merge_delete() {
        let store = MemoryDocumentStore::new();
        let first = store
            .add("posts", fields(json!({"title": "a"})))
            .await
            .expect("add");
        let second = store
            .add("posts", fields(json!({"title": "b"})))
            .await
            .expect("add");
        assert_ne!(first, second);

        store
            .merge("posts", &first, fields(json!({"categoryId": "c1"})))
            .await
            .expect("merge");
        let merged = store.get("posts", &first).await.expect("get").expect("doc");
        assert_eq!(merged["title"], "a");
        assert_eq!(merged["categoryId"], "c1");

        let listed = store.list("posts").await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].0, first);

        store.delete("posts", &first).await.expect("delete");
        assert!(matches!(
            store.delete("posts", &first).await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.list("posts").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn merge_creates_missing_document() {
        let store = MemoryDocumentStore::new();
        store
            .merge("users", "u1", fields(json!({"likedPosts": ["p1"]})))
            .await
            .expect("merge");
        let doc = store.get("users", "u1").await.expect("get").expect("doc");
        assert_eq!(doc["likedPosts"], json!(["p1"]));
    }

    #[tokio::test]
    async fn subcollections_are_independent() {
        let store = MemoryDocumentStore::new();
        store
            .add("posts/p1/comments", fields(json!({"text": "hi"})))
            .await
            .expect("add");
        store
            .add("posts/p2/comments", fields(json!({"text": "yo"})))
            .await
            .expect("add");

        store
            .delete_collection("posts/p1/comments")
            .await
            .expect("drop");
        assert!(store.list("posts/p1/comments").await.expect("list").is_empty());
        assert_eq!(store.list("posts/p2/comments").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn snapshot_survives_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state/snapshot.json");

        let store = MemoryDocumentStore::new();
        store
            .set("categories", "c1", fields(json!({"name": "Rust"})))
            .await
            .expect("set");
        store.save_snapshot(&path).await.expect("save");

        let restored = MemoryDocumentStore::load_snapshot(&path).await.expect("load");
        let doc = restored
            .get("categories", "c1")
            .await
            .expect("get")
            .expect("doc");
        assert_eq!(doc["name"], "Rust");

        let empty = MemoryDocumentStore::load_snapshot(&dir.path().join("missing.json"))
            .await
            .expect("missing file");
        assert!(empty.list("categories").await.expect("list").is_empty());
    }
}
