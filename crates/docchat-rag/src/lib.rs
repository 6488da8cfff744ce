//! RAG engine for docchat
//!
//! This crate provides the document handler and sentence splitter, the vector
//! index and its manager, the query tool and conversational agents, and the
//! orchestrator that wires them together.

mod agent;
mod documents;
mod engine;
mod index;
mod splitter;

#[cfg(test)]
mod tests;

pub use agent::{Agent, AgentManager, OpenAiAgent, QueryTool, ReActAgent, ToolChatModel};
pub use documents::DocumentHandler;
pub use engine::RagEngine;
pub use index::{IndexEntry, IndexManager, ScoredEntry, VectorIndex};
pub use splitter::SentenceSplitter;

// Re-export core types for convenience
pub use docchat_core::{
    ChatMessage, ChatModel, Config, Document, EmbeddingModel, Error, KeyValueStore, ModelType,
    Node, Result, Role, StoreType,
};
