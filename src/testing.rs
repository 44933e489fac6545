//! Scripted collaborators for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::NaiveDate;

use crate::agent::AffiliatePromoterAgent;
use crate::conversation::ChatHistory;
use crate::db::PersistenceClient;
use crate::llm::CodeGenerationBackend;
use crate::prompts::PromptGenerator;
use crate::rag::{RetrievalClient, ScoredStrategy, StrategyData};
use crate::sandbox::{CodeExecutionSandbox, ExecutionOutput};

/// Wrap `code` in a python fence
pub fn fenced(code: &str) -> String {
    format!("```python\n{}\n```", code)
}

/// Agent named `agent-test` with the default templates and a pinned date
pub fn test_agent(backend: ScriptedBackend) -> AffiliatePromoterAgent {
    let prompts = PromptGenerator::default()
        .with_fixed_date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    AffiliatePromoterAgent::new("agent-test", Arc::new(backend), prompts)
}

/// Backend replying from a queue. Clones share the queue.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<String>>>,
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<ChatHistory>>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    /// Every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatHistory> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CodeGenerationBackend for ScriptedBackend {
    async fn completion(&self, history: &ChatHistory) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(history.clone());

        if let Some(ref message) = self.failure {
            anyhow::bail!("{}", message);
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// Sandbox returning queued outputs and recording what it ran
#[derive(Clone, Default)]
pub struct ScriptedSandbox {
    outputs: Arc<Mutex<VecDeque<ExecutionOutput>>>,
    runs: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSandbox {
    pub fn new(outputs: impl IntoIterator<Item = ExecutionOutput>) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(outputs.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn ok(stdout: &str) -> ExecutionOutput {
        ExecutionOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn err(stderr: &str) -> ExecutionOutput {
        ExecutionOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(1),
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CodeExecutionSandbox for ScriptedSandbox {
    async fn run(&self, code: &str) -> Result<ExecutionOutput> {
        self.runs.lock().unwrap().push(code.to_string());
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted output left"))
    }
}

/// In-memory persistence
#[derive(Default)]
pub struct RecordingPersistence {
    histories: Mutex<Vec<(String, ChatHistory)>>,
    strategies: Mutex<Vec<StrategyData>>,
}

impl RecordingPersistence {
    pub fn with_strategy(strategy: StrategyData) -> Self {
        let persistence = Self::default();
        persistence.strategies.lock().unwrap().push(strategy);
        persistence
    }

    pub fn histories(&self) -> Vec<(String, ChatHistory)> {
        self.histories.lock().unwrap().clone()
    }

    pub fn strategies(&self) -> Vec<StrategyData> {
        self.strategies.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PersistenceClient for RecordingPersistence {
    async fn insert_chat_history(&self, session_id: &str, history: &ChatHistory) -> Result<()> {
        self.histories
            .lock()
            .unwrap()
            .push((session_id.to_string(), history.clone()));
        Ok(())
    }

    async fn insert_strategy_and_result(&self, strategy: &StrategyData) -> Result<()> {
        self.strategies.lock().unwrap().push(strategy.clone());
        Ok(())
    }

    async fn latest_strategy(&self, agent_id: &str) -> Result<Option<StrategyData>> {
        Ok(self
            .strategies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.agent_id == agent_id)
            .cloned())
    }
}

/// Retrieval answering every query with the same summaries
#[derive(Default)]
pub struct StubRetrieval {
    summaries: Vec<String>,
    queries: Mutex<Vec<String>>,
    saved: Mutex<Vec<StrategyData>>,
}

impl StubRetrieval {
    pub fn new<I, S>(summaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            summaries: summaries.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<StrategyData> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RetrievalClient for StubRetrieval {
    async fn relevant_strategies(&self, query: &str) -> Result<Vec<ScoredStrategy>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .summaries
            .iter()
            .map(|summary| ScoredStrategy {
                strategy: StrategyData::new("agent-test", summary.as_str(), ""),
                score: 0.8,
            })
            .collect())
    }

    async fn save_result_batch(&self, batch: &[StrategyData]) -> Result<usize> {
        self.saved.lock().unwrap().extend(batch.iter().cloned());
        Ok(batch.len())
    }
}
