//! Persistence of chat histories and strategies

mod storage;

pub use storage::JsonlStore;

use anyhow::Result;

use crate::conversation::ChatHistory;
use crate::rag::StrategyData;

/// Durable record of what the agent said and did
#[async_trait::async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Append a cycle's messages to the session transcript
    async fn insert_chat_history(&self, session_id: &str, history: &ChatHistory) -> Result<()>;

    /// Record a strategy and its outcome
    async fn insert_strategy_and_result(&self, strategy: &StrategyData) -> Result<()>;

    /// Most recently recorded strategy for `agent_id`
    async fn latest_strategy(&self, agent_id: &str) -> Result<Option<StrategyData>>;
}
