//! MongoDB store implementation

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use docchat_core::{Error, KeyValueStore, Result};

const COLLECTION: &str = "kv";

/// One persisted value; payloads are stored base64-encoded so the record
/// stays a plain string document.
#[derive(Debug, Serialize, Deserialize)]
struct KvRecord {
    #[serde(rename = "_id")]
    key: String,
    payload: String,
}

/// Key-value store backed by a MongoDB database.
///
/// The namespace selects the database; keys are document `_id`s in a single
/// collection, so no additional prefixing is needed.
pub struct MongoStore {
    collection: Collection<KvRecord>,
    namespace: String,
}

impl MongoStore {
    /// Connect using a MongoDB connection string.
    pub async fn connect(uri: &str, namespace: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to MongoDB at {}: {}", uri, e)))?;
        let collection = client.database(namespace).collection::<KvRecord>(COLLECTION);

        Ok(Self {
            collection,
            namespace: namespace.to_string(),
        })
    }
}

#[async_trait]
impl KeyValueStore for MongoStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let record = KvRecord {
            key: key.to_string(),
            payload: BASE64.encode(value),
        };
        self.collection
            .replace_one(doc! { "_id": key }, record)
            .upsert(true)
            .await
            .map_err(|e| Error::Store(format!("MongoDB upsert failed: {}", e)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let record = self
            .collection
            .find_one(doc! { "_id": key })
            .await
            .map_err(|e| Error::Store(format!("MongoDB find failed: {}", e)))?;

        match record {
            Some(record) => {
                let payload = BASE64
                    .decode(record.payload)
                    .map_err(|e| Error::Store(format!("Corrupt MongoDB payload: {}", e)))?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": key })
            .await
            .map_err(|e| Error::Store(format!("MongoDB delete failed: {}", e)))?;
        Ok(result.deleted_count > 0)
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
