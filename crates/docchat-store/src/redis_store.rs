//! Redis store implementation

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use docchat_core::{Error, KeyValueStore, Result};

/// Key-value store backed by a Redis server.
pub struct RedisStore {
    conn: MultiplexedConnection,
    namespace: String,
}

impl RedisStore {
    /// Connect to the Redis server at `host:port`.
    pub async fn connect(host: &str, port: u16, namespace: &str) -> Result<Self> {
        let url = format!("redis://{}:{}/", host, port);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| Error::Store(format!("Invalid Redis URL {}: {}", url, e)))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to Redis at {}: {}", url, e)))?;

        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(self.scoped(key), value)
            .await
            .map_err(|e| Error::Store(format!("Redis SET failed: {}", e)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(self.scoped(key))
            .await
            .map_err(|e| Error::Store(format!("Redis GET failed: {}", e)))?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(self.scoped(key))
            .await
            .map_err(|e| Error::Store(format!("Redis DEL failed: {}", e)))?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(self.scoped(key))
            .await
            .map_err(|e| Error::Store(format!("Redis EXISTS failed: {}", e)))?;
        Ok(exists)
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
