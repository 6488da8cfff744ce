//! Conversational agents over the vector index

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use docchat_core::{ChatMessage, ChatModel, EmbeddingModel, Error, Result};
use docchat_llm::{AssistantTurn, LlmManager, OpenAiClient};

use crate::index::{ScoredEntry, VectorIndex};

const DEFAULT_TOP_K: usize = 5;
const MAX_TOOL_TURNS: usize = 4;
const MAX_REACT_STEPS: usize = 5;

const SYNTHESIS_PROMPT: &str = "You answer questions about the user's indexed documents. \
Use only the provided context. If the context does not contain the answer, say so plainly.";

/// The index wrapped as a single named tool the agents can invoke.
pub struct QueryTool {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingModel>,
    llm: Arc<dyn ChatModel>,
    top_k: usize,
}

impl QueryTool {
    pub const NAME: &'static str = "agent";
    pub const DESCRIPTION: &'static str = "Answers questions related to the indexed data. \
Use a detailed plain text question as input to the tool.";

    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingModel>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Retrieve the most relevant chunks for `question` and synthesize an
    /// answer grounded in them.
    pub async fn call(&self, question: &str) -> Result<String> {
        let embedding = self.embedder.embed(question).await?;
        let hits = self.index.search(&embedding, self.top_k);

        if hits.is_empty() {
            return Ok("No relevant context was found in the index.".to_string());
        }

        let context = build_context(&hits);
        let messages = [
            ChatMessage::system(SYNTHESIS_PROMPT),
            ChatMessage::user(format!("Context:\n{}\nQuestion: {}", context, question)),
        ];
        self.llm.chat(&messages).await
    }
}

fn build_context(hits: &[ScoredEntry]) -> String {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!("{}. [{}] {}\n\n", i + 1, hit.source, hit.text));
    }
    context
}

/// A conversational agent bound to exactly one index.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String>;
}

/// Chat endpoint that can return tool calls alongside plain content.
#[async_trait]
pub trait ToolChatModel: Send + Sync {
    async fn chat_with_tools(&self, messages: &[Value], tools: &[Value]) -> Result<AssistantTurn>;
}

#[async_trait]
impl ToolChatModel for OpenAiClient {
    async fn chat_with_tools(&self, messages: &[Value], tools: &[Value]) -> Result<AssistantTurn> {
        OpenAiClient::chat_with_tools(self, messages, tools).await
    }
}

/// Agent using the provider's native function calling.
pub struct OpenAiAgent {
    client: Arc<dyn ToolChatModel>,
    tool: QueryTool,
}

impl OpenAiAgent {
    pub fn new(client: Arc<dyn ToolChatModel>, tool: QueryTool) -> Self {
        Self { client, tool }
    }

    fn tool_catalog() -> Vec<Value> {
        vec![json!({
            "type": "function",
            "function": {
                "name": QueryTool::NAME,
                "description": QueryTool::DESCRIPTION,
                "parameters": {
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "A detailed plain text question about the indexed data",
                        },
                    },
                    "required": ["question"],
                },
            },
        })]
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let tools = Self::tool_catalog();
        let mut messages = vec![
            json!({
                "role": "system",
                "content": "You answer questions about the user's indexed documents. \
Use the 'agent' tool to look up anything you are not certain about.",
            }),
            json!({ "role": "user", "content": prompt }),
        ];

        for _ in 0..MAX_TOOL_TURNS {
            let turn = self.client.chat_with_tools(&messages, &tools).await?;

            if turn.tool_calls.is_empty() {
                return turn.content.map(|c| c.trim().to_string()).ok_or_else(|| {
                    Error::Agent("Assistant returned neither content nor tool calls".to_string())
                });
            }

            messages.push(turn.message.clone());
            for call in &turn.tool_calls {
                let question = serde_json::from_str::<Value>(&call.arguments)
                    .ok()
                    .and_then(|args| args["question"].as_str().map(|q| q.to_string()))
                    .unwrap_or_else(|| call.arguments.clone());

                let observation = if call.name == QueryTool::NAME {
                    self.tool.call(&question).await?
                } else {
                    format!("Unknown tool '{}'", call.name)
                };

                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": observation,
                }));
            }
        }

        Err(Error::Agent(
            "Tool-call budget exhausted without a final answer".to_string(),
        ))
    }
}

/// ReAct-style agent for providers without native tool calling.
pub struct ReActAgent {
    llm: Arc<dyn ChatModel>,
    tool: QueryTool,
}

impl ReActAgent {
    pub fn new(llm: Arc<dyn ChatModel>, tool: QueryTool) -> Self {
        Self { llm, tool }
    }

    fn system_prompt() -> String {
        format!(
            "You answer questions about the user's indexed documents. \
You have access to the following tool:\n\n\
{}: {}\n\n\
Use this format:\n\n\
Thought: reason about what to do next\n\
Action: {}\n\
Action Input: the question to ask the tool\n\n\
After each action you will receive an Observation with the tool's answer. \
Repeat Thought/Action/Action Input as needed. When you know the answer, reply with:\n\n\
Final Answer: the answer to the user's question",
            QueryTool::NAME,
            QueryTool::DESCRIPTION,
            QueryTool::NAME,
        )
    }
}

#[async_trait]
impl Agent for ReActAgent {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let mut messages = vec![
            ChatMessage::system(Self::system_prompt()),
            ChatMessage::user(prompt.to_string()),
        ];

        for _ in 0..MAX_REACT_STEPS {
            let reply = self.llm.chat(&messages).await?;

            if let Some(answer) = parse_final_answer(&reply) {
                return Ok(answer);
            }

            match parse_action(&reply) {
                Some((action, input)) => {
                    let observation = if action == QueryTool::NAME {
                        self.tool.call(&input).await?
                    } else {
                        format!("Unknown tool '{}'", action)
                    };
                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::user(format!("Observation: {}", observation)));
                }
                // No parseable action: the reply is the answer.
                None => return Ok(reply.trim().to_string()),
            }
        }

        Err(Error::Agent(
            "Step budget exhausted without a final answer".to_string(),
        ))
    }
}

pub(crate) fn parse_final_answer(reply: &str) -> Option<String> {
    reply
        .split_once("Final Answer:")
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|answer| !answer.is_empty())
}

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Action:\s*(.+)$").unwrap());
static ACTION_INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Action Input:\s*(.+)$").unwrap());

pub(crate) fn parse_action(reply: &str) -> Option<(String, String)> {
    let action = ACTION_RE.captures(reply)?.get(1)?.as_str().trim().to_string();
    let input = ACTION_INPUT_RE.captures(reply)?.get(1)?.as_str().trim().to_string();
    Some((action, input))
}

/// Wraps the index as a queryable tool and instantiates the provider-specific
/// conversational agent around it.
///
/// Created per orchestration run and discarded afterwards; conversational
/// memory does not persist between runs.
pub struct AgentManager {
    agent: Box<dyn Agent>,
}

impl AgentManager {
    pub fn new(index: Arc<VectorIndex>, llm_manager: &LlmManager) -> Self {
        let tool = QueryTool::new(
            index,
            llm_manager.embedding_model(),
            llm_manager.chat_model(),
        );

        let agent: Box<dyn Agent> = match llm_manager.openai_client() {
            Some(client) => Box::new(OpenAiAgent::new(client, tool)),
            None => Box::new(ReActAgent::new(llm_manager.chat_model(), tool)),
        };

        Self { agent }
    }

    /// Send the prompt to the agent and return its textual reply. Provider
    /// failures propagate to the caller unchanged.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        self.agent.chat(prompt).await
    }
}
