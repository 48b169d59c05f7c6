//! Blob store adapters: one opaque value per namespace.

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, namespace: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, namespace: &str, value: &[u8]) -> Result<()>;
    async fn delete(&self, namespace: &str) -> Result<bool>;
    fn name(&self) -> &'static str;
}

/// Stores each namespace as `<dir>/<namespace>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, namespace: &str) -> Result<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !namespace.starts_with('.');
        if !valid {
            return Err(Error::validation_with_context(
                format!("invalid namespace {:?}", namespace),
                ErrorContext::new()
                    .with_field_path("namespace")
                    .with_details("expected [A-Za-z0-9_.-]+ not starting with '.'")
                    .with_source("file_blob_store"),
            ));
        }
        Ok(self.dir.join(format!("{}.json", namespace)))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, namespace: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(namespace)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, namespace: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(namespace)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            Error::Persistence(format!(
                "failed to move snapshot into place at {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }

    async fn delete(&self, namespace: &str) -> Result<bool> {
        let path = self.path_for(namespace)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Process-local blob store; clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, namespace: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .cloned())
    }
    async fn set(&self, namespace: &str, value: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace.to_string(), value.to_vec());
        Ok(())
    }
    async fn delete(&self, namespace: &str) -> Result<bool> {
        Ok(self
            .blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(namespace)
            .is_some())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}
