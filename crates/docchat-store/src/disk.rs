//! Disk-backed store implementation (sled)

use std::path::Path;

use async_trait::async_trait;

use docchat_core::{Error, KeyValueStore, Result};

/// Durable key-value store persisted under the configured directory.
pub struct DiskStore {
    db: sled::Db,
    namespace: String,
}

impl DiskStore {
    /// Open (or create) the database directory.
    pub fn open(path: &Path, namespace: &str) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| Error::Store(format!("Failed to open disk store at {:?}: {}", path, e)))?;
        Ok(Self {
            db,
            namespace: namespace.to_string(),
        })
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl KeyValueStore for DiskStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .insert(self.scoped(key).as_bytes(), value.to_vec())
            .map_err(|e| Error::Store(format!("Disk store write failed: {}", e)))?;
        self.db
            .flush_async()
            .await
            .map_err(|e| Error::Store(format!("Disk store flush failed: {}", e)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .get(self.scoped(key).as_bytes())
            .map_err(|e| Error::Store(format!("Disk store read failed: {}", e)))?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .db
            .remove(self.scoped(key).as_bytes())
            .map_err(|e| Error::Store(format!("Disk store delete failed: {}", e)))?;
        Ok(removed.is_some())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
