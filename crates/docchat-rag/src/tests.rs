//! Tests for index persistence, the query tool, and the agents

use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use docchat_core::{ChatMessage, ChatModel, Config, EmbeddingModel, KeyValueStore, Result};
use docchat_llm::{AssistantTurn, ToolCall};
use docchat_store::MemoryStore;

use crate::agent::{Agent, OpenAiAgent, QueryTool, ReActAgent, ToolChatModel};
use crate::documents::DocumentHandler;
use crate::engine::RagEngine;
use crate::index::IndexManager;

/// Deterministic embedder: a normalized byte histogram. Identical texts get
/// identical vectors, similar texts similar ones.
pub(crate) struct StubEmbedder;

#[async_trait]
impl EmbeddingModel for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut histogram = vec![0.0f32; 16];
        for byte in text.bytes() {
            histogram[(byte % 16) as usize] += 1.0;
        }
        let norm: f32 = histogram.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut histogram {
                *value /= norm;
            }
        }
        Ok(histogram)
    }

    fn model_id(&self) -> &str {
        "stub-embed"
    }
}

/// Chat model that replays canned replies and records every request.
pub(crate) struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    pub(crate) requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub(crate) fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| docchat_core::Error::LlmProvider("Script exhausted".to_string()))
    }

    fn model_id(&self) -> &str {
        "stub-chat"
    }
}

/// Tool-aware chat endpoint that replays canned assistant turns and records
/// every transcript it was sent.
struct ScriptedToolChat {
    turns: Mutex<VecDeque<AssistantTurn>>,
    transcripts: Mutex<Vec<Vec<Value>>>,
}

impl ScriptedToolChat {
    fn new(turns: Vec<AssistantTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            transcripts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ToolChatModel for ScriptedToolChat {
    async fn chat_with_tools(&self, messages: &[Value], _tools: &[Value]) -> Result<AssistantTurn> {
        self.transcripts.lock().unwrap().push(messages.to_vec());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| docchat_core::Error::LlmProvider("Script exhausted".to_string()))
    }
}

fn tool_call_turn(id: &str, name: &str, arguments: &str) -> AssistantTurn {
    AssistantTurn {
        message: json!({
            "role": "assistant",
            "tool_calls": [{
                "id": id,
                "type": "function",
                "function": { "name": name, "arguments": arguments },
            }],
        }),
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
    }
}

fn content_turn(text: &str) -> AssistantTurn {
    AssistantTurn {
        message: json!({ "role": "assistant", "content": text }),
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
    }
}

/// Store wrapper counting reads, to observe index reuse.
struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new("counting"),
            gets: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    fn namespace(&self) -> &str {
        self.inner.namespace()
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

fn handler_for(dir: &Path) -> DocumentHandler {
    DocumentHandler::new(&[dir.display().to_string()], 1024)
}

#[tokio::test]
async fn created_index_is_loadable_by_a_fresh_manager() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "The quarterly report covers revenue. It also covers churn.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));

    let mut manager = IndexManager::new(store.clone(), handler_for(dir.path()), Arc::new(StubEmbedder));
    let created = manager.create_index("default").await.unwrap();
    assert!(!created.is_empty());

    // A fresh manager simulates a new process sharing the same store.
    let mut fresh = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let loaded = fresh.load_index("default").await.unwrap().unwrap();
    assert_eq!(loaded.len(), created.len());
    assert_eq!(loaded.embedding_model, "stub-embed");
}

#[tokio::test]
async fn loading_a_missing_index_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));

    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    assert!(manager.load_index("absent").await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_persisted_index_is_treated_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    store.put("default", b"not json").await.unwrap();

    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    assert!(manager.load_index("default").await.unwrap().is_none());
}

#[tokio::test]
async fn in_memory_index_is_reused_without_reloading() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "Some content to index. A second sentence.");

    let counting = Arc::new(CountingStore::new());
    let store: Arc<dyn KeyValueStore> = counting.clone();

    let mut manager = IndexManager::new(store.clone(), handler_for(dir.path()), Arc::new(StubEmbedder));
    manager.create_index("default").await.unwrap();

    // Both resolutions hit the cached index, not the store.
    assert!(manager.get_or_load("default").await.unwrap().is_some());
    assert!(manager.get_or_load("default").await.unwrap().is_some());
    assert_eq!(counting.gets.load(Ordering::SeqCst), 0);

    // A fresh manager loads once, then reuses.
    let mut fresh = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    assert!(fresh.get_or_load("default").await.unwrap().is_some());
    assert!(fresh.get_or_load("default").await.unwrap().is_some());
    assert_eq!(counting.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_index_fails_on_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));

    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    assert!(manager.create_index("default").await.is_err());
}

#[tokio::test]
async fn query_tool_feeds_retrieved_context_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "alpha alpha alpha alpha.");
    write_file(dir.path(), "b.txt", "zzzz zzzz zzzz zzzz.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let chat = Arc::new(ScriptedChat::new(&["The answer."]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), chat.clone());

    let answer = tool.call("alpha alpha alpha alpha.").await.unwrap();
    assert_eq!(answer, "The answer.");

    let requests = chat.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let user_message = &requests[0][1];
    assert!(user_message.content.contains("alpha"));
    assert!(user_message.content.contains("Question:"));
}

#[tokio::test]
async fn react_agent_runs_the_tool_loop_to_a_final_answer() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "The report total is forty-two units.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    // Reply 1: the agent decides to use the tool. Reply 2: the synthesis
    // inside the tool. Reply 3: the agent's final answer.
    let chat = Arc::new(ScriptedChat::new(&[
        "Thought: I should check the index.\nAction: agent\nAction Input: What is the report total?",
        "The report total is forty-two units.",
        "Final Answer: The total is forty-two units.",
    ]));

    let tool = QueryTool::new(index, Arc::new(StubEmbedder), chat.clone());
    let agent = ReActAgent::new(chat.clone(), tool);

    let answer = agent.chat("What is the report total?").await.unwrap();
    assert_eq!(answer, "The total is forty-two units.");
    assert_eq!(chat.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn react_agent_accepts_a_plain_reply_as_the_answer() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "Content for the index.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let chat = Arc::new(ScriptedChat::new(&["It is in the documents."]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), chat.clone());
    let agent = ReActAgent::new(chat, tool);

    let answer = agent.chat("Where is it?").await.unwrap();
    assert_eq!(answer, "It is in the documents.");
}

#[tokio::test]
async fn openai_agent_executes_a_tool_call_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "The report total is forty-two units.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let synthesis = Arc::new(ScriptedChat::new(&["The report total is forty-two units."]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), synthesis.clone());

    let turns = vec![
        tool_call_turn("call-1", "agent", r#"{"question":"What is the report total?"}"#),
        content_turn("The total is forty-two units."),
    ];
    let client = Arc::new(ScriptedToolChat::new(turns));
    let agent = OpenAiAgent::new(client.clone(), tool);

    let answer = agent.chat("What is the report total?").await.unwrap();
    assert_eq!(answer, "The total is forty-two units.");

    // The second request carries the echoed assistant turn and the tool
    // result, addressed by the call id.
    let transcripts = client.transcripts.lock().unwrap();
    assert_eq!(transcripts.len(), 2);
    let followup = &transcripts[1];
    assert_eq!(followup.len(), 4);
    assert_eq!(followup[2]["tool_calls"][0]["id"], "call-1");
    assert_eq!(followup[3]["role"], "tool");
    assert_eq!(followup[3]["tool_call_id"], "call-1");
    assert_eq!(followup[3]["content"], "The report total is forty-two units.");

    // The tool passed the extracted question into synthesis.
    let requests = synthesis.requests.lock().unwrap();
    assert!(requests[0][1].content.contains("What is the report total?"));
}

#[tokio::test]
async fn openai_agent_accepts_raw_string_tool_arguments() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "The report total is forty-two units.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let synthesis = Arc::new(ScriptedChat::new(&["Forty-two units."]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), synthesis.clone());

    // Arguments that are not a JSON object are used verbatim as the question.
    let turns = vec![
        tool_call_turn("call-1", "agent", "What is the report total?"),
        content_turn("Forty-two units."),
    ];
    let agent = OpenAiAgent::new(Arc::new(ScriptedToolChat::new(turns)), tool);

    let answer = agent.chat("What is the report total?").await.unwrap();
    assert_eq!(answer, "Forty-two units.");

    let requests = synthesis.requests.lock().unwrap();
    assert!(requests[0][1].content.contains("What is the report total?"));
}

#[tokio::test]
async fn openai_agent_reports_an_unknown_tool_back_to_the_model() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "Content for the index.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let synthesis = Arc::new(ScriptedChat::new(&[]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), synthesis);

    let turns = vec![
        tool_call_turn("call-1", "search", r#"{"question":"anything"}"#),
        content_turn("Done."),
    ];
    let client = Arc::new(ScriptedToolChat::new(turns));
    let agent = OpenAiAgent::new(client.clone(), tool);

    let answer = agent.chat("anything").await.unwrap();
    assert_eq!(answer, "Done.");

    let transcripts = client.transcripts.lock().unwrap();
    assert_eq!(transcripts[1][3]["content"], "Unknown tool 'search'");
}

#[tokio::test]
async fn openai_agent_errors_when_the_tool_call_budget_is_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.txt", "Content for the index.");

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new("ns"));
    let mut manager = IndexManager::new(store, handler_for(dir.path()), Arc::new(StubEmbedder));
    let index = manager.create_index("default").await.unwrap();

    let synthesis = Arc::new(ScriptedChat::new(&["one", "two", "three", "four"]));
    let tool = QueryTool::new(index, Arc::new(StubEmbedder), synthesis);

    // Every turn asks for another tool call; the loop must give up instead
    // of spinning forever.
    let turns = (0..4)
        .map(|i| tool_call_turn(&format!("call-{}", i), "agent", r#"{"question":"again"}"#))
        .collect();
    let client = Arc::new(ScriptedToolChat::new(turns));
    let agent = OpenAiAgent::new(client.clone(), tool);

    assert!(agent.chat("anything").await.is_err());
    assert_eq!(client.transcripts.lock().unwrap().len(), 4);
}

fn engine_config(dir: &Path) -> Config {
    let pairs = vec![
        ("MODEL_TYPE".to_string(), "ollama".to_string()),
        ("OLLAMA_MODEL".to_string(), "llama3".to_string()),
        ("STORE_TYPE".to_string(), "memory".to_string()),
        ("INPUT_FILES".to_string(), dir.display().to_string()),
    ];
    Config::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

#[tokio::test]
async fn engine_builds_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let engine = RagEngine::new(engine_config(dir.path())).await.unwrap();
    assert_eq!(engine.config().namespace, "default");
}

#[tokio::test]
async fn engine_run_without_an_index_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = RagEngine::new(engine_config(dir.path())).await.unwrap();
    assert!(engine.run("anything", "default").await.is_err());
}

#[tokio::test]
async fn engine_load_index_offers_creation_on_first_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = RagEngine::new(engine_config(dir.path())).await.unwrap();
    assert!(engine.load_index("default").await.unwrap().is_none());
}
