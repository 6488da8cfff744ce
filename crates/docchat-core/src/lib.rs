//! Core traits and types for docchat
//!
//! This crate defines the fundamental traits and types used across the docchat
//! system: the environment-backed configuration, the error taxonomy, and the
//! capability-facing interfaces for chat models, embedding models, and
//! key-value stores, making the system test-friendly and extensible.

pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod store;

pub use config::{Config, ModelType, StoreType};
pub use document::{Document, Node};
pub use error::{Error, Result};
pub use llm::{ChatMessage, ChatModel, EmbeddingModel, Role};
pub use store::KeyValueStore;
