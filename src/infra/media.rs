//! Filesystem-backed image storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use slug::slugify;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::application::media::{ImageStore, MediaError, StoredImage};

const IMAGE_PREFIX: &str = "images";

/// Stores images under `root/images/{uuid}-{name}` and serves them from
/// `{public_base_url}/media/{path}`.
#[derive(Debug)]
pub struct FsImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsImageStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base_url: &str) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(MediaError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

fn io_error(err: std::io::Error) -> MediaError {
    MediaError::Backend(err.to_string())
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn store(&self, name: &str, data: Bytes) -> Result<StoredImage, MediaError> {
        if data.is_empty() {
            return Err(MediaError::EmptyPayload);
        }

        let path = format!(
            "{IMAGE_PREFIX}/{}-{}",
            Uuid::new_v4().simple(),
            sanitize_filename(name)
        );
        let absolute = self.resolve(&path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let mut file = fs::File::create(&absolute).await.map_err(io_error)?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(io_error(err));
        }
        file.flush().await.map_err(io_error)?;

        let checksum = hex::encode(Sha256::digest(&data));
        debug!(
            target = "blogboard::media",
            path = %path,
            size = data.len(),
            checksum = %checksum,
            "image stored"
        );

        Ok(StoredImage { path })
    }

    fn public_url(&self, image: &StoredImage) -> String {
        format!("{}/media/{}", self.public_base_url, image.path)
    }

    async fn read(&self, path: &str) -> Result<Bytes, MediaError> {
        let absolute = self.resolve(path)?;
        match fs::read(absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(MediaError::InvalidPath),
            Err(err) => Err(io_error(err)),
        }
    }
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "image".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_slugged() {
        assert_eq!(sanitize_filename("My Photo.JPG"), "my-photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("???"), "image");
    }

    #[tokio::test]
    async fn stores_and_reads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::new(dir.path().to_path_buf(), "http://localhost:8080/")
            .expect("store");

        let stored = store
            .store("cat.png", Bytes::from_static(b"meow"))
            .await
            .expect("stored");
        assert!(stored.path.starts_with("images/"));
        assert!(stored.path.ends_with("-cat.png"));
        assert_eq!(
            store.public_url(&stored),
            format!("http://localhost:8080/media/{}", stored.path)
        );
        assert_eq!(
            store.read(&stored.path).await.expect("read"),
            Bytes::from_static(b"meow")
        );
    }

    #[tokio::test]
    async fn rejects_empty_and_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsImageStore::new(dir.path().to_path_buf(), "").expect("store");

        assert!(matches!(
            store.store("a.png", Bytes::new()).await,
            Err(MediaError::EmptyPayload)
        ));
        assert!(matches!(
            store.read("../secret").await,
            Err(MediaError::InvalidPath)
        ));
        assert!(matches!(
            store.read("/etc/passwd").await,
            Err(MediaError::InvalidPath)
        ));
    }
}
