//! RAG orchestrator

use std::sync::Arc;

use docchat_core::{Config, Error, Result};
use docchat_llm::LlmManager;
use docchat_store::StoreManager;

use crate::agent::AgentManager;
use crate::documents::DocumentHandler;
use crate::index::{IndexManager, VectorIndex};

/// Composes the storage manager, document handler, index manager, and LLM
/// manager, and relays prompts to a per-run agent.
pub struct RagEngine {
    config: Config,
    index_manager: IndexManager,
    llm_manager: LlmManager,
}

impl RagEngine {
    /// Eagerly build all managers; any factory failure aborts construction.
    pub async fn new(config: Config) -> Result<Self> {
        let store = StoreManager::create(config.store_type, &config).await?;
        let documents = DocumentHandler::new(&config.input_files, config.chunk_size);
        let llm_manager = LlmManager::create(&config)?;
        let index_manager = IndexManager::new(store, documents, llm_manager.embedding_model());

        log::debug!(
            "RAG engine ready: store={}, model={}",
            config.store_type.as_str(),
            config.model_type.as_str()
        );

        Ok(Self {
            config,
            index_manager,
            llm_manager,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build and persist an index under `key_name`.
    pub async fn create_index(&mut self, key_name: &str) -> Result<()> {
        self.index_manager.create_index(key_name).await?;
        Ok(())
    }

    /// Attempt to load a persisted index; `None` means no usable index
    /// exists and the caller may offer creation.
    pub async fn load_index(&mut self, key_name: &str) -> Result<Option<Arc<VectorIndex>>> {
        self.index_manager.load_index(key_name).await
    }

    /// Resolve the index (in-memory if present, else loaded from the store),
    /// bind a fresh agent to it, and return the agent's reply.
    ///
    /// Each call rebuilds the agent; conversational memory does not persist
    /// across calls.
    pub async fn run(&mut self, prompt: &str, key_name: &str) -> Result<String> {
        let index = self
            .index_manager
            .get_or_load(key_name)
            .await?
            .ok_or_else(|| {
                Error::Index(format!(
                    "No index found under '{}'; create one first",
                    key_name
                ))
            })?;

        let agent = AgentManager::new(index, &self.llm_manager);
        agent.chat(prompt).await
    }
}
