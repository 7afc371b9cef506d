use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Key-value persistence backing the user store.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
}

/// One JSON file per key inside `root`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key.contains("..") {
            anyhow::bail!("invalid storage key {:?}", key);
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StorageClient for FileStorage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(buf) => Ok(Some(Bytes::from(buf))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.object_path(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create data dir {}", self.root.display()))?;

        // Readers only ever see the old file or the complete new one.
        let tmp = self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        let stored = async {
            tokio::fs::write(&tmp, &body)
                .await
                .with_context(|| format!("write {}", tmp.display()))?;
            tokio::fs::rename(&tmp, &path)
                .await
                .with_context(|| format!("rename into {}", path.display()))
        }
        .await;
        if let Err(e) = stored {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        debug!(key, bytes = body.len(), "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "object deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("delete {}", path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.objects.lock().await.get(key).cloned())
    }

    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        self.objects.lock().await.insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().await.remove(key);
        Ok(())
    }
}
