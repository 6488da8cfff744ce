//! Tests for the LLM manager factory

use docchat_core::{Config, ModelType};

use crate::LlmManager;

fn config_from(pairs: &[(&str, &str)]) -> Config {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

#[test]
fn openai_manager_requires_api_key() {
    let config = config_from(&[("MODEL_TYPE", "openai")]);
    assert!(LlmManager::create(&config).is_err());
}

#[test]
fn openai_manager_exposes_native_client() {
    let config = config_from(&[
        ("MODEL_TYPE", "openai"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_MODEL", "gpt-4o-mini"),
    ]);
    let manager = LlmManager::create(&config).unwrap();

    assert_eq!(manager.model_type(), ModelType::OpenAi);
    assert!(manager.openai_client().is_some());
    assert_eq!(manager.chat_model().model_id(), "gpt-4o-mini");
}

#[test]
fn ollama_manager_builds_without_credentials() {
    let config = config_from(&[("MODEL_TYPE", "ollama"), ("OLLAMA_MODEL", "llama3")]);
    let manager = LlmManager::create(&config).unwrap();

    assert_eq!(manager.model_type(), ModelType::Ollama);
    assert!(manager.openai_client().is_none());
    assert_eq!(manager.chat_model().model_id(), "llama3");
}

#[test]
fn embedding_model_defaults_per_provider() {
    let config = config_from(&[("MODEL_TYPE", "openai"), ("OPENAI_API_KEY", "sk-test")]);
    let manager = LlmManager::create(&config).unwrap();
    assert_eq!(manager.embedding_model().model_id(), "text-embedding-3-small");

    let config = config_from(&[
        ("MODEL_TYPE", "ollama"),
        ("OLLAMA_MODEL", "llama3"),
        ("EMBEDDING_MODEL", "mxbai-embed-large"),
    ]);
    let manager = LlmManager::create(&config).unwrap();
    assert_eq!(manager.embedding_model().model_id(), "mxbai-embed-large");
}
