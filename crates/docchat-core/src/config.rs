//! Environment-backed configuration
//!
//! All secrets and runtime settings come from environment variables (usually
//! via a `.env` file loaded by the binary). `Config` uses a zero-argument
//! `from_env` constructor and provides `validate` so the application can fail
//! fast with clear errors before any backend cost is incurred.

use std::path::PathBuf;
use std::str::FromStr;

use serde_json::json;

use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_STORE_HOST: &str = "localhost";
pub const DEFAULT_STORE_PORT: u16 = 6379;
pub const DEFAULT_PERSIST_DIR: &str = "./chroma_db";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_INPUT_FILES: &str = "./data";
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Which LLM provider backs the chat and embedding models.
///
/// Unknown tags fail at configuration-parse time rather than deep inside
/// factory construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    OpenAi,
    Ollama,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::OpenAi => "openai",
            ModelType::Ollama => "ollama",
        }
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ModelType::OpenAi),
            "ollama" | "open_source" => Ok(ModelType::Ollama),
            other => Err(Error::Configuration(format!(
                "unsupported MODEL_TYPE '{}' (expected 'openai' or 'ollama')",
                other
            ))),
        }
    }
}

/// Which backend persists the index between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Redis,
    Mongodb,
    Disk,
    Memory,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Redis => "redis",
            StoreType::Mongodb => "mongodb",
            StoreType::Disk => "disk",
            StoreType::Memory => "memory",
        }
    }
}

impl FromStr for StoreType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreType::Redis),
            "mongodb" => Ok(StoreType::Mongodb),
            "disk" | "chroma" => Ok(StoreType::Disk),
            "memory" => Ok(StoreType::Memory),
            other => Err(Error::Configuration(format!(
                "unsupported STORE_TYPE '{}' (expected 'redis', 'mongodb', 'disk', or 'memory')",
                other
            ))),
        }
    }
}

/// Flat record of environment-derived settings.
///
/// Constructed once per process at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    // -------- LLM --------
    pub model_type: ModelType,
    pub openai_api_key: Option<String>,
    pub model: String,
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,

    // -------- Storage --------
    pub store_type: StoreType,
    store_host: Option<String>,
    store_port: Option<u16>,
    pub persist_dir: PathBuf,
    pub mongodb_uri: Option<String>,
    pub namespace: String,

    // -------- Input / index --------
    pub input_files: Vec<String>,
    pub embedding_model: Option<String>,

    // -------- RAG params --------
    pub chunk_size: usize,
    pub temperature: f32,
    pub persist_disk: bool,
}

impl Config {
    /// Read all settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read all settings through a lookup closure.
    ///
    /// This is what `from_env` delegates to; tests supply a map-backed
    /// closure instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let model_type = match get("MODEL_TYPE") {
            Some(raw) => raw.parse::<ModelType>()?,
            None => ModelType::OpenAi,
        };
        let store_type = match get("STORE_TYPE") {
            Some(raw) => raw.parse::<StoreType>()?,
            None => StoreType::Redis,
        };

        // Allow either explicit OPENAI_MODEL or the generic MODEL variable.
        let model = get("OPENAI_MODEL")
            .or_else(|| get("MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        // Host/port presence is tracked separately from the defaults so the
        // MongoDB validation rule can tell "explicitly set" from "defaulted".
        let store_host = get("STORE_HOST");
        let store_port = get("STORE_PORT").and_then(|raw| match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                log::warn!("STORE_PORT '{}' is not a valid port, using {}", raw, DEFAULT_STORE_PORT);
                None
            }
        });

        let input_files: Vec<String> = get("INPUT_FILES")
            .unwrap_or_else(|| DEFAULT_INPUT_FILES.to_string())
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let chunk_size = get("CHUNK_SIZE")
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let temperature = get("TEMPERATURE")
            .and_then(|raw| raw.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let persist_disk = get("PERSIST_DISK")
            .map(|raw| matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            model_type,
            openai_api_key: get("OPENAI_API_KEY"),
            model,
            ollama_base_url: get("OLLAMA_BASE_URL"),
            ollama_model: get("OLLAMA_MODEL"),
            store_type,
            store_host,
            store_port,
            persist_dir: PathBuf::from(
                get("CHROMA_PERSIST_DIR").unwrap_or_else(|| DEFAULT_PERSIST_DIR.to_string()),
            ),
            mongodb_uri: get("MONGODB_URI"),
            namespace: get("NAMESPACE")
                .or_else(|| get("MONGODB_DB"))
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            input_files,
            embedding_model: get("EMBEDDING_MODEL"),
            chunk_size,
            temperature,
            persist_disk,
        })
    }

    /// Effective store host, falling back to the documented default.
    pub fn store_host(&self) -> &str {
        self.store_host.as_deref().unwrap_or(DEFAULT_STORE_HOST)
    }

    /// Effective store port, falling back to the documented default.
    pub fn store_port(&self) -> u16 {
        self.store_port.unwrap_or(DEFAULT_STORE_PORT)
    }

    /// Validate required configuration values.
    ///
    /// When `strict` is true, every missing-required-setting condition is
    /// collected and reported as a single fatal configuration error. When
    /// false, violations are only logged and execution proceeds.
    pub fn validate(&self, strict: bool) -> Result<()> {
        let mut errors = Vec::new();

        if self.model_type == ModelType::OpenAi && self.openai_api_key.is_none() {
            errors.push("OPENAI_API_KEY is required when MODEL_TYPE=openai".to_string());
        }

        if self.model_type == ModelType::Ollama
            && self.ollama_base_url.is_none()
            && self.ollama_model.is_none()
        {
            errors.push(
                "OLLAMA_BASE_URL or OLLAMA_MODEL should be set when MODEL_TYPE=ollama".to_string(),
            );
        }

        if self.store_type == StoreType::Mongodb
            && self.mongodb_uri.is_none()
            && !(self.store_host.is_some() && self.store_port.is_some())
        {
            errors.push(
                "MONGODB_URI or STORE_HOST/STORE_PORT must be set when STORE_TYPE=mongodb"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            return Ok(());
        }

        let msg = format!("Configuration validation failed: {}", errors.join("; "));
        if strict {
            Err(Error::Configuration(msg))
        } else {
            log::warn!("{}", msg);
            Ok(())
        }
    }

    /// Redacted snapshot for diagnostic logging: credentials are reduced to
    /// presence booleans.
    pub fn redacted(&self) -> serde_json::Value {
        json!({
            "model_type": self.model_type.as_str(),
            "model": self.model,
            "openai_api_key": self.openai_api_key.is_some(),
            "ollama_base_url": self.ollama_base_url,
            "ollama_model": self.ollama_model,
            "store_type": self.store_type.as_str(),
            "store_host": self.store_host(),
            "store_port": self.store_port(),
            "persist_dir": self.persist_dir,
            "mongodb_uri": self.mongodb_uri.is_some(),
            "namespace": self.namespace,
            "input_files": self.input_files,
            "embedding_model": self.embedding_model,
            "chunk_size": self.chunk_size,
            "temperature": self.temperature,
            "persist_disk": self.persist_disk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.model_type, ModelType::OpenAi);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.store_type, StoreType::Redis);
        assert_eq!(config.store_host(), "localhost");
        assert_eq!(config.store_port(), 6379);
        assert_eq!(config.namespace, "default");
        assert_eq!(config.input_files, vec!["./data".to_string()]);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.temperature, 0.0);
        assert!(!config.persist_disk);
    }

    #[test]
    fn openai_without_api_key_fails_strict_validation() {
        let config = config_from(&[("MODEL_TYPE", "openai")]).unwrap();
        assert!(config.validate(true).is_err());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn openai_with_api_key_passes_validation() {
        let config =
            config_from(&[("MODEL_TYPE", "openai"), ("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn ollama_requires_base_url_or_model() {
        let config = config_from(&[("MODEL_TYPE", "ollama")]).unwrap();
        assert!(config.validate(true).is_err());

        let config =
            config_from(&[("MODEL_TYPE", "ollama"), ("OLLAMA_MODEL", "llama3")]).unwrap();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn open_source_tag_maps_to_ollama() {
        let config = config_from(&[
            ("MODEL_TYPE", "open_source"),
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
        ])
        .unwrap();
        assert_eq!(config.model_type, ModelType::Ollama);
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn mongodb_without_uri_or_address_fails_validation() {
        let config = config_from(&[
            ("MODEL_TYPE", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("STORE_TYPE", "mongodb"),
        ])
        .unwrap();
        assert!(config.validate(true).is_err());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn mongodb_with_uri_passes_validation() {
        let config = config_from(&[
            ("MODEL_TYPE", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("STORE_TYPE", "mongodb"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ])
        .unwrap();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn mongodb_with_explicit_host_and_port_passes_validation() {
        let config = config_from(&[
            ("MODEL_TYPE", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("STORE_TYPE", "mongodb"),
            ("STORE_HOST", "mongo.internal"),
            ("STORE_PORT", "27017"),
        ])
        .unwrap();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn unparseable_port_and_chunk_size_fall_back_to_defaults() {
        let config =
            config_from(&[("STORE_PORT", "abc"), ("CHUNK_SIZE", "not-a-number")]).unwrap();
        assert_eq!(config.store_port(), 6379);
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn input_files_are_trimmed_and_empties_dropped() {
        let config = config_from(&[("INPUT_FILES", "./a, ./b ,")]).unwrap();
        assert_eq!(config.input_files, vec!["./a".to_string(), "./b".to_string()]);
    }

    #[test]
    fn unknown_model_type_fails_at_parse_time() {
        assert!(config_from(&[("MODEL_TYPE", "claude")]).is_err());
    }

    #[test]
    fn unknown_store_type_fails_at_parse_time() {
        assert!(config_from(&[("STORE_TYPE", "cassandra")]).is_err());
    }

    #[test]
    fn chroma_tag_maps_to_disk_store() {
        let config = config_from(&[("STORE_TYPE", "chroma")]).unwrap();
        assert_eq!(config.store_type, StoreType::Disk);
    }

    #[test]
    fn redacted_snapshot_hides_credentials() {
        let config = config_from(&[("OPENAI_API_KEY", "sk-secret")]).unwrap();
        let snapshot = config.redacted();
        assert_eq!(snapshot["openai_api_key"], serde_json::json!(true));
        assert!(snapshot.to_string().find("sk-secret").is_none());
    }

    #[test]
    fn generic_model_variable_is_honored() {
        let config = config_from(&[("MODEL", "gpt-4o-mini")]).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");

        // OPENAI_MODEL wins over MODEL.
        let config =
            config_from(&[("MODEL", "gpt-4o-mini"), ("OPENAI_MODEL", "gpt-4o")]).unwrap();
        assert_eq!(config.model, "gpt-4o");
    }
}
