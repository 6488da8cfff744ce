//! Vector index and its manager

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docchat_core::{EmbeddingModel, Error, KeyValueStore, Result};

use crate::documents::DocumentHandler;

/// One embedded chunk inside a persisted index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

/// A retrieval hit from a similarity search
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub score: f32,
    pub text: String,
    pub source: String,
}

/// A searchable structure over document chunks.
///
/// Serialized as JSON into the configured key-value store; the format is
/// owned by this crate, the layout below the key by the store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub created_at: DateTime<Utc>,
    pub embedding_model: String,
    pub entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine-similarity search over the entries.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredEntry> {
        let mut results: Vec<ScoredEntry> = self
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                score: cosine_similarity(query, &entry.embedding),
                text: entry.text.clone(),
                source: entry.source.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Builds, persists, and rehydrates vector indexes.
///
/// Once an index has been created or loaded in this process, it is reused
/// in memory rather than reloaded from the store, trading a small staleness
/// risk for avoiding redundant I/O.
pub struct IndexManager {
    store: Arc<dyn KeyValueStore>,
    documents: DocumentHandler,
    embedder: Arc<dyn EmbeddingModel>,
    current: Option<Arc<VectorIndex>>,
}

impl IndexManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        documents: DocumentHandler,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Self {
        Self {
            store,
            documents,
            embedder,
            current: None,
        }
    }

    /// The in-memory index, if one was created or loaded in this process.
    pub fn current(&self) -> Option<Arc<VectorIndex>> {
        self.current.clone()
    }

    /// Build a new index from the document handler's chunks, persist it under
    /// `key_name`, and keep it as the in-memory current index.
    pub async fn create_index(&mut self, key_name: &str) -> Result<Arc<VectorIndex>> {
        let nodes = self.documents.nodes()?;
        if nodes.is_empty() {
            return Err(Error::Index(
                "No indexable content found in the configured input paths".to_string(),
            ));
        }

        let texts: Vec<String> = nodes.iter().map(|node| node.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries = nodes
            .into_iter()
            .zip(embeddings)
            .map(|(node, embedding)| IndexEntry {
                id: node.id,
                text: node.text,
                source: node.source,
                embedding,
            })
            .collect::<Vec<_>>();

        let index = VectorIndex {
            created_at: Utc::now(),
            embedding_model: self.embedder.model_id().to_string(),
            entries,
        };

        let payload = serde_json::to_vec(&index)?;
        self.store.put(key_name, &payload).await?;
        log::info!(
            "Created index '{}' with {} chunks ({} bytes)",
            key_name,
            index.len(),
            payload.len()
        );

        let index = Arc::new(index);
        self.current = Some(index.clone());
        Ok(index)
    }

    /// Attempt to rehydrate a previously persisted index.
    ///
    /// A missing key is the expected first-run condition and yields
    /// `Ok(None)`. Backend failures and unreadable payloads also yield
    /// `Ok(None)` so callers can fall back to creation, but they are logged
    /// distinctly because they can mask real operational problems.
    pub async fn load_index(&mut self, key_name: &str) -> Result<Option<Arc<VectorIndex>>> {
        let payload = match self.store.get(key_name).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                log::debug!("No persisted index under '{}'", key_name);
                return Ok(None);
            }
            Err(e) => {
                log::warn!(
                    "Store failure while loading index '{}', treating as missing: {}",
                    key_name,
                    e
                );
                return Ok(None);
            }
        };

        match serde_json::from_slice::<VectorIndex>(&payload) {
            Ok(index) => {
                log::info!("Loaded index '{}' with {} chunks", key_name, index.len());
                let index = Arc::new(index);
                self.current = Some(index.clone());
                Ok(Some(index))
            }
            Err(e) => {
                log::warn!(
                    "Persisted index '{}' is unreadable, treating as missing: {}",
                    key_name,
                    e
                );
                Ok(None)
            }
        }
    }

    /// The in-memory index when present, otherwise a load attempt.
    pub async fn get_or_load(&mut self, key_name: &str) -> Result<Option<Arc<VectorIndex>>> {
        if let Some(index) = self.current.clone() {
            return Ok(Some(index));
        }
        self.load_index(key_name).await
    }
}
