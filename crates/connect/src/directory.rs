//! An object store over a local directory.
//!
//! Object keys map to relative file paths below the root. Listing walks the
//! tree and reports `/`-separated keys regardless of platform.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConnectError;
use crate::record::ObjectMeta;
use crate::traits::{AttachmentSource, ObjectStore};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under the root, refusing anything that would
    /// leave it.
    fn path_for(&self, key: &str) -> Result<PathBuf, ConnectError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(ConnectError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    fn io(key: &str, source: std::io::Error) -> ConnectError {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConnectError::NotFound {
                key: key.to_string(),
            }
        } else {
            ConnectError::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl ObjectStore for DirectoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, ConnectError> {
        let mut found = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];
        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::io(&key_prefix, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Self::io(&key_prefix, e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = format!("{}{}", key_prefix, name);
                let file_type = entry.file_type().await.map_err(|e| Self::io(&key, e))?;
                if file_type.is_dir() {
                    let child = format!("{}/", key);
                    // Only descend where a matching key can still appear.
                    if child.starts_with(prefix) || prefix.starts_with(&child) {
                        pending.push((entry.path(), child));
                    }
                } else if key.starts_with(prefix) {
                    let size = entry.metadata().await.map_err(|e| Self::io(&key, e))?.len();
                    found.push(ObjectMeta { key, size });
                }
            }
        }
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ConnectError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| Self::io(key, e))
    }

    async fn exists(&self, key: &str) -> Result<bool, ConnectError> {
        let path = self.path_for(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io(key, e)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ConnectError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io(key, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Self::io(key, e))
    }
}

/// Serves attachment downloads from a local mirror of the form provider.
///
/// A download URL `{base_url}/{name}` is read from `{root}/{name}`; URLs
/// outside `base_url` are not found.
#[derive(Debug, Clone)]
pub struct DirectoryAttachmentSource {
    base_url: String,
    files: DirectoryStore,
}

impl DirectoryAttachmentSource {
    pub fn new(base_url: &str, root: impl Into<PathBuf>) -> Self {
        DirectoryAttachmentSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            files: DirectoryStore::new(root),
        }
    }
}

#[async_trait]
impl AttachmentSource for DirectoryAttachmentSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ConnectError> {
        let name = url
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| ConnectError::NotFound {
                key: url.to_string(),
            })?;
        self.files.get(name).await
    }
}
