//! LLM provider integrations for docchat
//!
//! This crate provides the OpenAI and Ollama implementations of the
//! `ChatModel` and `EmbeddingModel` traits, and the `LlmManager` factory
//! that selects between them.

mod ollama;
mod openai;

#[cfg(test)]
mod tests;

pub use ollama::OllamaClient;
pub use openai::{AssistantTurn, OpenAiClient, ToolCall};

use std::sync::Arc;

use docchat_core::{ChatModel, Config, EmbeddingModel, Error, ModelType, Result};

/// Factory that configures the chat model and the embedding model consumed
/// by the index and agent managers.
pub struct LlmManager {
    model_type: ModelType,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingModel>,
    openai: Option<Arc<OpenAiClient>>,
}

impl LlmManager {
    /// Build the provider selected by the configuration.
    ///
    /// Construction only builds HTTP clients; no network I/O happens until
    /// the first chat or embedding call.
    pub fn create(config: &Config) -> Result<Self> {
        match config.model_type {
            ModelType::OpenAi => {
                let api_key = config.openai_api_key.clone().ok_or_else(|| {
                    Error::Configuration(
                        "OPENAI_API_KEY is required when MODEL_TYPE=openai".to_string(),
                    )
                })?;
                let client = Arc::new(OpenAiClient::new(
                    api_key,
                    config.model.clone(),
                    config.embedding_model.clone(),
                    config.temperature,
                )?);
                Ok(Self {
                    model_type: ModelType::OpenAi,
                    chat: client.clone(),
                    embedder: client.clone(),
                    openai: Some(client),
                })
            }
            ModelType::Ollama => {
                let client = Arc::new(OllamaClient::new(
                    config.ollama_base_url.clone(),
                    config.ollama_model.clone(),
                    config.embedding_model.clone(),
                    config.temperature,
                )?);
                Ok(Self {
                    model_type: ModelType::Ollama,
                    chat: client.clone(),
                    embedder: client,
                    openai: None,
                })
            }
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn chat_model(&self) -> Arc<dyn ChatModel> {
        self.chat.clone()
    }

    pub fn embedding_model(&self) -> Arc<dyn EmbeddingModel> {
        self.embedder.clone()
    }

    /// Concrete OpenAI client, available only for the OpenAI provider; the
    /// tool-calling agent needs its native function-calling request form.
    pub fn openai_client(&self) -> Option<Arc<OpenAiClient>> {
        self.openai.clone()
    }
}
