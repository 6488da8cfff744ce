//! Key-value storage backends for docchat
//!
//! This crate provides the store factory and the backend implementations of
//! the `KeyValueStore` trait: Redis, MongoDB, sled (disk), and an in-memory
//! store for tests and ephemeral runs.

mod disk;
mod memory;
mod mongo;
mod redis_store;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use redis_store::RedisStore;

use std::sync::Arc;

use docchat_core::{Config, KeyValueStore, Result, StoreType};

/// Factory that returns a backend-specific store handle.
pub struct StoreManager;

impl StoreManager {
    /// Build the store selected by `store_type`, scoped to the configured
    /// namespace. An unreachable backend fails here, aborting orchestrator
    /// construction.
    pub async fn create(store_type: StoreType, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
        match store_type {
            StoreType::Redis => {
                let store = RedisStore::connect(
                    config.store_host(),
                    config.store_port(),
                    &config.namespace,
                )
                .await?;
                Ok(Arc::new(store))
            }
            StoreType::Mongodb => {
                let uri = config.mongodb_uri.clone().unwrap_or_else(|| {
                    format!("mongodb://{}:{}", config.store_host(), config.store_port())
                });
                let store = MongoStore::connect(&uri, &config.namespace).await?;
                Ok(Arc::new(store))
            }
            StoreType::Disk => {
                if config.persist_disk {
                    let store = DiskStore::open(&config.persist_dir, &config.namespace)?;
                    Ok(Arc::new(store))
                } else {
                    log::warn!(
                        "PERSIST_DISK is disabled; the disk store will not survive this process"
                    );
                    Ok(Arc::new(MemoryStore::new(&config.namespace)))
                }
            }
            StoreType::Memory => Ok(Arc::new(MemoryStore::new(&config.namespace))),
        }
    }
}
