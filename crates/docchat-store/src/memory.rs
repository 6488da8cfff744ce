//! In-memory store implementation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use docchat_core::{Error, KeyValueStore, Result};

/// In-process key-value store backed by a `HashMap`.
///
/// Used for tests and for the disk store type when persistence is disabled.
/// Contents are lost when the process exits.
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    namespace: String,
}

impl MemoryStore {
    pub fn new(namespace: &str) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            namespace: namespace.to_string(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        entries.insert(self.scoped(key), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        Ok(entries.get(&self.scoped(key)).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Store(format!("Lock error: {}", e)))?;
        Ok(entries.remove(&self.scoped(key)).is_some())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
