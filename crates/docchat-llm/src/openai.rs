//! OpenAI client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use docchat_core::{ChatMessage, ChatModel, EmbeddingModel, Error, Result, Role};

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// One tool invocation requested by the model
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One assistant turn from the tool-aware chat endpoint
#[derive(Debug, Clone)]
pub struct AssistantTurn {
    /// The raw assistant message, echoed back verbatim into the transcript
    /// when tool results are submitted
    pub message: Value,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// OpenAI client covering chat completions, embeddings, and the native
/// function-calling request form used by the OpenAI agent.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(
        api_key: String,
        model: String,
        embedding_model: Option<String>,
        temperature: f32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
            embedding_model: embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            temperature,
        })
    }

    /// Override the API base URL (for proxies and compatible endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LlmProvider(format!(
                "OpenAI API request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Chat with a tool catalog; the reply is either plain content or one or
    /// more tool calls to execute.
    pub async fn chat_with_tools(
        &self,
        messages: &[Value],
        tools: &[Value],
    ) -> Result<AssistantTurn> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        let response = self.post_json("/chat/completions", &body).await?;
        let message = response["choices"]
            .get(0)
            .and_then(|choice| choice.get("message"))
            .cloned()
            .ok_or_else(|| {
                Error::LlmProvider("OpenAI response contained no choices".to_string())
            })?;

        let content = message["content"].as_str().map(|s| s.to_string());
        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|call| {
                        Some(ToolCall {
                            id: call["id"].as_str()?.to_string(),
                            name: call["function"]["name"].as_str()?.to_string(),
                            arguments: call["function"]["arguments"].as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(AssistantTurn {
            message,
            content,
            tool_calls,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.temperature,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let response = self.post_json("/chat/completions", &body).await?;
        let content = response["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| {
                Error::LlmProvider("Empty response from OpenAI chat API".to_string())
            })?;

        Ok(content.trim().to_string())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::LlmProvider("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let response = self.post_json("/embeddings", &body).await?;
        let mut data: EmbeddingResponse = serde_json::from_value(response)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if data.data.len() != texts.len() {
            return Err(Error::LlmProvider(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.data.len()
            )));
        }

        data.data.sort_by_key(|item| item.index);
        Ok(data.data.into_iter().map(|item| item.embedding).collect())
    }

    fn model_id(&self) -> &str {
        &self.embedding_model
    }
}
