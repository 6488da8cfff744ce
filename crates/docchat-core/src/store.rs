//! Key-value store trait
//!
//! The only capability the index manager requires from a storage backend is
//! durable key-value persistence scoped by namespace.

use async_trait::async_trait;

use crate::Result;

/// Trait for key-value stores (e.g., Redis, MongoDB, sled)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Persist a value under a key within this store's namespace
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch a value by key; `None` when the key has never been written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// The namespace this store is scoped to
    fn namespace(&self) -> &str;
}
